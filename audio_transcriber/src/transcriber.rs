use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use speech_client::{PollOptions, SpeechClient, SpeechError};
use subtitles::{AssembleOptions, SubtitleError};
use thiserror::Error;
use tracing::instrument;
use types::Status;

use crate::config::RecognitionSettings;

#[derive(Error, Debug)]
pub enum TranscriberError {
    #[error(transparent)]
    Speech(#[from] SpeechError),
    #[error("Recognition operation {name} failed: {status}")]
    RemoteOperation { name: String, status: Status },
    #[error("Recognition operation {name} did not finish within {} seconds", .timeout.as_secs())]
    OperationTimeout { name: String, timeout: Duration },
    #[error("Transcription was cancelled")]
    Cancelled,
    #[error("Failed to build subtitles: {0}")]
    Subtitles(#[from] SubtitleError),
    #[error("Failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TranscriberError {
    fn from_wait(err: SpeechError) -> Self {
        match err {
            SpeechError::OperationFailed { name, status } => {
                Self::RemoteOperation { name, status }
            }
            SpeechError::Timeout { name, timeout } => {
                Self::OperationTimeout { name, timeout }
            }
            other => Self::Speech(other),
        }
    }
}

/// Runs one recognition job and writes its subtitles.
///
/// The speech client, and with it the HTTP connection pool, is owned by
/// the transcriber and released when it is dropped.
#[derive(Debug)]
pub struct Transcriber {
    speech: SpeechClient,
    settings: RecognitionSettings,
    poll: PollOptions,
    assemble: AssembleOptions,
    results_dir: PathBuf,
}

impl Transcriber {
    #[must_use]
    pub fn new(speech: SpeechClient, settings: RecognitionSettings) -> Self {
        Self {
            speech,
            settings,
            poll: PollOptions::default(),
            assemble: AssembleOptions::default(),
            results_dir: PathBuf::from("results"),
        }
    }

    #[must_use]
    pub fn poll_options(self, poll: PollOptions) -> Self {
        Self { poll, ..self }
    }

    #[must_use]
    pub fn assemble_options(self, assemble: AssembleOptions) -> Self {
        Self { assemble, ..self }
    }

    #[must_use]
    pub fn results_dir(self, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            ..self
        }
    }

    /// Transcribes the audio at `source_uri` and writes the subtitles to
    /// `<results_dir>/<output_name_hint><unix seconds>.srt`. Ctrl-C while
    /// waiting for the recognition job cancels the run.
    ///
    /// Returns the written path, or `None` when the recognition produced
    /// no subtitles and nothing was written.
    ///
    /// # Errors
    /// See [`Transcriber::transcribe_until`].
    pub async fn transcribe(
        &self,
        source_uri: &str,
        output_name_hint: &str,
    ) -> Result<Option<PathBuf>, TranscriberError> {
        self.transcribe_until(source_uri, output_name_hint, shutdown_signal())
            .await
    }

    /// Like [`Transcriber::transcribe`], but cancelled when `shutdown`
    /// completes instead of on Ctrl-C.
    ///
    /// # Errors
    /// - `TranscriberError::Speech` if the job cannot be submitted or
    ///   polled.
    /// - `TranscriberError::RemoteOperation` if the job itself failed.
    /// - `TranscriberError::OperationTimeout` if the job did not finish in
    ///   time, `TranscriberError::Cancelled` if `shutdown` fired first.
    /// - `TranscriberError::Subtitles` if the results cannot be rendered.
    /// - `TranscriberError::Output` if the file cannot be written.
    #[instrument(skip(self, shutdown))]
    pub async fn transcribe_until(
        &self,
        source_uri: &str,
        output_name_hint: &str,
        shutdown: impl Future<Output = ()>,
    ) -> Result<Option<PathBuf>, TranscriberError> {
        let request = self.settings.request(source_uri);
        let operation = self.speech.long_running_recognize(&request).await?;

        tracing::info!(
            "Waiting for recognition operation {} to finish",
            operation.name
        );

        let wait = self.speech.wait_for_operation(operation, &self.poll);

        let response = tokio::select! {
            response = wait => response.map_err(TranscriberError::from_wait)?,
            () = shutdown => {
                tracing::warn!("Cancelled while waiting for recognition");
                return Err(TranscriberError::Cancelled);
            }
        };

        tracing::info!(
            "Recognition finished with {} results",
            response.results.len()
        );

        let srt = subtitles::assemble(&response.results, &self.assemble)?;

        if srt.is_empty() {
            tracing::info!("Recognition produced no subtitles");
            return Ok(None);
        }

        let path = self.output_path(output_name_hint);
        write_output(&path, &srt).await?;

        tracing::info!("Wrote subtitles to {}", path.display());

        Ok(Some(path))
    }

    fn output_path(&self, output_name_hint: &str) -> PathBuf {
        self.results_dir.join(format!(
            "{output_name_hint}{}.srt",
            chrono::Utc::now().timestamp()
        ))
    }
}

async fn write_output(path: &Path, srt: &str) -> Result<(), TranscriberError> {
    let io_error = |source: std::io::Error| TranscriberError::Output {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }

    tokio::fs::write(path, srt).await.map_err(io_error)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}
