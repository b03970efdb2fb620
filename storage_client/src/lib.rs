use std::path::Path;
use std::sync::Arc;

use google_auth::{AuthError, TokenProvider};
use thiserror::Error;
use tracing::instrument;
use types::StorageObject;

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to authenticate: {0}")]
    Auth(#[from] AuthError),
    #[error("Failed to read {path}: {source}")]
    FileIO {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Request to the storage API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Storage API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<TokenProvider>,
}

impl StorageClient {
    #[must_use]
    pub fn new(http: reqwest::Client, tokens: Arc<TokenProvider>) -> Self {
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tokens,
        }
    }

    #[must_use]
    pub fn endpoint(self, endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            ..self
        }
    }

    /// Uploads a local file into `bucket` under `key` with a single media
    /// upload request. The file is streamed, not buffered.
    ///
    /// # Errors
    /// - `StorageError::FileIO` if the local file cannot be opened.
    /// - `StorageError::Auth` if no access token can be obtained.
    /// - `StorageError::Request` or `StorageError::Api` if the upload fails.
    #[instrument(skip(self), fields(local_path = %local_path.display()))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> Result<StorageObject, StorageError> {
        let io_error = |source: std::io::Error| StorageError::FileIO {
            path: local_path.display().to_string(),
            source,
        };

        let file = tokio::fs::File::open(local_path).await.map_err(io_error)?;
        let file_size = file.metadata().await.map_err(io_error)?.len();

        let access_token = self.tokens.access_token().await?;

        tracing::info!(
            "Uploading {} bytes to gs://{}/{}",
            file_size,
            bucket,
            key
        );

        let response = self
            .http
            .post(format!(
                "{}/upload/storage/v1/b/{bucket}/o",
                self.endpoint
            ))
            .query(&[("uploadType", "media"), ("name", key)])
            .header(
                "Authorization",
                format!("Bearer {}", access_token.expose_secret()),
            )
            .header("Content-Type", content_type_for(local_path))
            .header("Content-Length", file_size.to_string())
            .body(file)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Storage API returned {}: {}", status, body);

            return Err(StorageError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let object: StorageObject = response.json().await?;

        tracing::info!(
            "Uploaded {} to gs://{}/{}",
            local_path
                .file_name()
                .map_or_else(String::new, |name| name.to_string_lossy().into()),
            object.bucket,
            object.name
        );

        Ok(object)
    }
}

/// Media type for the upload, from the file extension.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "opus") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY_FILE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../testdata/service_account.json"
    );

    async fn client_for(server: &MockServer) -> StorageClient {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "access_token": "ya29.storage",
                    "expires_in": 3600
                }),
            ))
            .mount(server)
            .await;

        let mut key = google_auth::load_service_account_key(KEY_FILE).unwrap();
        key.token_uri = format!("{}/token", server.uri());

        let http = reqwest::Client::new();
        let tokens = TokenProvider::new(key, http.clone()).unwrap();

        StorageClient::new(http, Arc::new(tokens)).endpoint(&server.uri())
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a/b.wav")), "audio/wav");
        assert_eq!(content_type_for(Path::new("b.FLAC")), "audio/flac");
        assert_eq!(content_type_for(Path::new("b.mp3")), "audio/mpeg");
        assert_eq!(
            content_type_for(Path::new("notes")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_upload_object() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let local_path = dir.path().join("audioSample.wav");
        std::fs::write(&local_path, b"RIFF....WAVEfmt ").unwrap();

        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/sermons/o"))
            .and(query_param("uploadType", "media"))
            .and(query_param("name", "2024/audioSample.wav"))
            .and(header("Authorization", "Bearer ya29.storage"))
            .and(header("Content-Type", "audio/wav"))
            .and(body_string("RIFF....WAVEfmt "))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "kind": "storage#object",
                    "name": "2024/audioSample.wav",
                    "bucket": "sermons",
                    "size": "16",
                    "contentType": "audio/wav"
                }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let object = client
            .upload_object("sermons", "2024/audioSample.wav", &local_path)
            .await
            .unwrap();

        assert_eq!(object.bucket, "sermons");
        assert_eq!(object.name, "2024/audioSample.wav");
        assert_eq!(object.size.as_deref(), Some("16"));
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        let result = client
            .upload_object(
                "sermons",
                "missing.wav",
                Path::new("/nonexistent/missing.wav"),
            )
            .await;

        assert!(matches!(result, Err(StorageError::FileIO { .. })));
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let local_path = dir.path().join("audio.bin");
        std::fs::write(&local_path, b"data").unwrap();

        Mock::given(method("POST"))
            .and(path("/upload/storage/v1/b/locked/o"))
            .respond_with(
                ResponseTemplate::new(403).set_body_string("Access denied."),
            )
            .mount(&server)
            .await;

        match client.upload_object("locked", "audio.bin", &local_path).await {
            Err(StorageError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "Access denied.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
