/// This module submits long-running recognition jobs to the Cloud
/// Speech-to-Text v1 REST API and waits for them to finish.
/// Waiting is a bounded poll: the operation is fetched every
/// `PollOptions::interval` until it reports `done` or
/// `PollOptions::timeout` elapses.
use std::sync::Arc;
use std::time::Duration;

use google_auth::{AuthError, TokenProvider};
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::instrument;
use types::{
    LongRunningRecognizeRequest, LongRunningRecognizeResponse, Operation,
    Status,
};

pub const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com";

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Failed to authenticate: {0}")]
    Auth(#[from] AuthError),
    #[error("Request to the speech API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Speech API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Recognition operation {name} failed with {status}")]
    OperationFailed { name: String, status: Status },
    #[error("Recognition operation {name} finished without a response")]
    MissingResponse { name: String },
    #[error("Recognition operation {name} did not finish within {} seconds", .timeout.as_secs())]
    Timeout { name: String, timeout: Duration },
}

/// How often and for how long to poll a running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<TokenProvider>,
}

impl SpeechClient {
    #[must_use]
    pub fn new(http: reqwest::Client, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tokens,
        }
    }

    /// Points the client at another API root, e.g. a regional endpoint.
    #[must_use]
    pub fn endpoint(self, endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            ..self
        }
    }

    /// Starts an asynchronous recognition job and returns its operation
    /// handle.
    ///
    /// # Errors
    /// `SpeechError::Auth`, `SpeechError::Request`, or `SpeechError::Api`
    /// when the service rejects the request.
    #[instrument(skip(self, request), fields(uri = %request.audio.uri))]
    pub async fn long_running_recognize(
        &self,
        request: &LongRunningRecognizeRequest,
    ) -> Result<Operation, SpeechError> {
        let access_token = self.tokens.access_token().await?;

        tracing::debug!(
            "Recognition request: {}",
            serde_json::to_string(request).unwrap_or_default()
        );

        let response = self
            .http
            .post(format!("{}/v1/speech:longrunningrecognize", self.endpoint))
            .header(
                "Authorization",
                format!("Bearer {}", access_token.expose_secret()),
            )
            .json(request)
            .send()
            .await?;

        let operation: Operation = parse_response(response).await?;

        tracing::info!("Started recognition operation {}", operation.name);

        Ok(operation)
    }

    /// Fetches the current state of an operation.
    ///
    /// # Errors
    /// `SpeechError::Auth`, `SpeechError::Request` or `SpeechError::Api`.
    #[instrument(skip(self))]
    pub async fn get_operation(
        &self,
        name: &str,
    ) -> Result<Operation, SpeechError> {
        let access_token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(format!("{}/v1/operations/{name}", self.endpoint))
            .header(
                "Authorization",
                format!("Bearer {}", access_token.expose_secret()),
            )
            .send()
            .await?;

        parse_response(response).await
    }

    /// Polls `operation` until it is done and returns the recognition
    /// response.
    ///
    /// # Errors
    /// - `SpeechError::Timeout` if the operation is still running after
    ///   `options.timeout`.
    /// - `SpeechError::OperationFailed` if it finished with an error.
    /// - `SpeechError::MissingResponse` if it finished with neither.
    /// - any error from [`SpeechClient::get_operation`].
    #[instrument(skip(self, operation), fields(name = %operation.name))]
    pub async fn wait_for_operation(
        &self,
        operation: Operation,
        options: &PollOptions,
    ) -> Result<LongRunningRecognizeResponse, SpeechError> {
        let name = operation.name.clone();

        match timeout(options.timeout, self.poll(operation, options.interval))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(
                    "Recognition operation {} timed out after {} seconds",
                    name,
                    options.timeout.as_secs()
                );

                Err(SpeechError::Timeout {
                    name,
                    timeout: options.timeout,
                })
            }
        }
    }

    async fn poll(
        &self,
        mut operation: Operation,
        interval: Duration,
    ) -> Result<LongRunningRecognizeResponse, SpeechError> {
        let mut last_progress = None;

        while !operation.done {
            let progress = operation
                .metadata
                .as_ref()
                .and_then(|metadata| metadata.progress_percent);

            if progress.is_some() && progress != last_progress {
                tracing::info!(
                    "Recognition operation {} is {}% complete",
                    operation.name,
                    progress.unwrap_or_default()
                );
                last_progress = progress;
            }

            sleep(interval).await;
            operation = self.get_operation(&operation.name).await?;
        }

        finish(operation)
    }
}

/// Turns a finished operation into its response or its error.
fn finish(
    operation: Operation,
) -> Result<LongRunningRecognizeResponse, SpeechError> {
    if let Some(status) = operation.error {
        tracing::error!(
            "Recognition operation {} failed: {:?}",
            operation.name,
            status
        );

        return Err(SpeechError::OperationFailed {
            name: operation.name,
            status,
        });
    }

    operation.response.ok_or(SpeechError::MissingResponse {
        name: operation.name,
    })
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SpeechError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Speech API returned {}: {}", status, body);

        return Err(SpeechError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
