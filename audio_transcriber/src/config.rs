use std::path::{Path, PathBuf};
use std::time::Duration;

use app_context::CloudSettings;
use serde::Deserialize;
use speech_client::PollOptions;
use subtitles::{AssembleOptions, Clock, MalformedPolicy};
use types::{
    AudioEncoding, InteractionType, LongRunningRecognizeRequest,
    OriginalMediaType, RecognitionAudio, RecognitionConfig,
    RecognitionMetadata, SpeechContext,
};

/// Job configuration, read from the raw process environment.
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_speech_phrases")]
    pub speech_phrases: Vec<String>,

    #[serde(default = "default_audio_channel_count")]
    pub audio_channel_count: u32,

    #[serde(default)]
    pub audio_encoding: AudioEncoding,

    #[serde(default)]
    pub sample_rate_hertz: Option<u32>,

    #[serde(default)]
    pub recognition_model: Option<String>,

    #[serde(default = "default_true")]
    pub enable_automatic_punctuation: bool,

    #[serde(default)]
    pub interaction_type: InteractionType,

    #[serde(default)]
    pub original_media_type: OriginalMediaType,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    #[serde(default)]
    pub subtitle_clock: Clock,

    #[serde(default)]
    pub skip_malformed_results: bool,

    #[serde(default = "default_speech_endpoint")]
    pub speech_endpoint: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_language_code() -> String {
    "ru-RU".to_string()
}

fn default_speech_phrases() -> Vec<String> {
    vec![
        "Проповедь".to_string(),
        "Бог".to_string(),
        "Евангелие".to_string(),
    ]
}

const fn default_audio_channel_count() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_poll_interval_secs() -> u64 {
    10
}

const fn default_operation_timeout_secs() -> u64 {
    3600
}

fn default_speech_endpoint() -> String {
    speech_client::DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    "speech-subtitles/0.1".to_string()
}

impl Config {
    #[must_use]
    pub fn recognition_settings(&self) -> RecognitionSettings {
        RecognitionSettings {
            language_code: self.language_code.clone(),
            phrases: self.speech_phrases.clone(),
            encoding: self.audio_encoding,
            audio_channel_count: self.audio_channel_count,
            sample_rate_hertz: self.sample_rate_hertz,
            model: self.recognition_model.clone(),
            enable_automatic_punctuation: self.enable_automatic_punctuation,
            interaction_type: self.interaction_type,
            original_media_type: self.original_media_type,
        }
    }

    #[must_use]
    pub const fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.operation_timeout_secs),
        }
    }

    #[must_use]
    pub const fn assemble_options(&self) -> AssembleOptions {
        AssembleOptions {
            clock: self.subtitle_clock,
            on_malformed: if self.skip_malformed_results {
                MalformedPolicy::Skip
            } else {
                MalformedPolicy::Abort
            },
        }
    }
}

impl CloudSettings for Config {
    fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Parameters of the recognition request. Word time offsets are always
/// requested since subtitles cannot be timed without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub language_code: String,
    pub phrases: Vec<String>,
    pub encoding: AudioEncoding,
    pub audio_channel_count: u32,
    pub sample_rate_hertz: Option<u32>,
    pub model: Option<String>,
    pub enable_automatic_punctuation: bool,
    pub interaction_type: InteractionType,
    pub original_media_type: OriginalMediaType,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            language_code: default_language_code(),
            phrases: default_speech_phrases(),
            encoding: AudioEncoding::default(),
            audio_channel_count: default_audio_channel_count(),
            sample_rate_hertz: None,
            model: None,
            enable_automatic_punctuation: true,
            interaction_type: InteractionType::default(),
            original_media_type: OriginalMediaType::default(),
        }
    }
}

impl RecognitionSettings {
    /// Builds the recognition request for the audio object at `source_uri`.
    #[must_use]
    pub fn request(&self, source_uri: &str) -> LongRunningRecognizeRequest {
        let speech_contexts = if self.phrases.is_empty() {
            Vec::new()
        } else {
            vec![SpeechContext {
                phrases: self.phrases.clone(),
            }]
        };

        LongRunningRecognizeRequest {
            config: RecognitionConfig {
                encoding: self.encoding,
                sample_rate_hertz: self.sample_rate_hertz,
                audio_channel_count: self.audio_channel_count,
                enable_automatic_punctuation: self
                    .enable_automatic_punctuation,
                enable_word_time_offsets: true,
                language_code: self.language_code.clone(),
                speech_contexts,
                metadata: Some(RecognitionMetadata {
                    interaction_type: self.interaction_type,
                    original_media_type: self.original_media_type,
                }),
                model: self.model.clone(),
            },
            audio: RecognitionAudio {
                uri: source_uri.to_string(),
            },
        }
    }
}
