use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Duration;

/// Encoding of the audio data sent in the recognition request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    EncodingUnspecified,

    #[default]
    Linear16,

    Flac,

    Mulaw,

    Amr,

    AmrWb,

    OggOpus,

    SpeexWithHeaderByte,

    Mp3,

    WebmOpus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionType {
    InteractionTypeUnspecified,

    Discussion,

    Presentation,

    PhoneCall,

    Voicemail,

    #[default]
    ProfessionallyProduced,

    VoiceSearch,

    VoiceCommand,

    Dictation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginalMediaType {
    OriginalMediaTypeUnspecified,

    Audio,

    #[default]
    Video,
}

/// Description of the audio content, used by the service to pick a
/// better model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionMetadata {
    pub interaction_type: InteractionType,

    pub original_media_type: OriginalMediaType,
}

/// Phrase hints that boost recognition of domain vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechContext {
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate_hertz: Option<u32>,

    pub audio_channel_count: u32,

    pub enable_automatic_punctuation: bool,

    pub enable_word_time_offsets: bool,

    pub language_code: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speech_contexts: Vec<SpeechContext>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RecognitionMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Audio source of a recognition request. Only cloud storage URIs
/// (`gs://bucket/object`) are used here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionAudio {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongRunningRecognizeRequest {
    pub config: RecognitionConfig,

    pub audio: RecognitionAudio,
}

/// Timing of one recognized word, relative to the start of the audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordInfo {
    #[serde(default)]
    pub start_time: Duration,

    #[serde(default)]
    pub end_time: Duration,

    #[serde(default)]
    pub word: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_tag: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechRecognitionAlternative {
    #[serde(default)]
    pub transcript: String,

    #[serde(default)]
    pub confidence: f32,

    #[serde(default)]
    pub words: Vec<WordInfo>,
}

/// A consecutive portion of the audio. Alternatives are ordered most
/// likely first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRecognitionResult {
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_tag: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_end_time: Option<Duration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningRecognizeResponse {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_billed_time: Option<Duration>,
}

/// Progress information attached to a running recognition operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongRunningRecognizeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// `google.rpc.Status`, the error payload of a failed operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}

/// A long-running operation handle as returned by the recognition API.
/// Exactly one of `response` or `error` is set once `done` is true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,

    #[serde(default)]
    pub done: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LongRunningRecognizeMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<LongRunningRecognizeResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
}

/// The JSON key file of a service account.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,

    #[serde(default)]
    pub project_id: Option<String>,

    #[serde(default)]
    pub private_key_id: Option<String>,

    pub private_key: redact::Secret<String>,

    pub client_email: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Object resource returned by the storage upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObject {
    pub name: String,

    pub bucket: String,

    /// Size in bytes; the JSON API encodes it as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}
