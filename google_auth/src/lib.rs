//! Service account authentication for the Google Cloud REST APIs.
//!
//! A JSON key file is loaded once at start-up. Access tokens are obtained
//! with the OAuth 2.0 JWT bearer grant: an RS256-signed assertion naming
//! the service account is exchanged at the key's `token_uri` for a
//! short-lived bearer token, which is cached until shortly before it
//! expires.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), google_auth::AuthError> {
//! let key = google_auth::load_service_account_key("config.json")?;
//! let tokens = google_auth::TokenProvider::new(key, reqwest::Client::new())?;
//! let token = tokens.access_token().await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use redact::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::instrument;
use types::ServiceAccountKey;

pub const CLOUD_PLATFORM_SCOPE: &str =
    "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion (the maximum allowed).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Cached tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read credentials file {path}: {source}")]
    CredentialsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse credentials file: {0}")]
    CredentialsParse(#[from] serde_json::Error),
    #[error("Unsupported credentials type: {0}")]
    UnsupportedKeyType(String),
    #[error("Invalid service account private key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),
    #[error("Failed to sign token assertion: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("Token request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },
}

/// Reads and validates a service account JSON key file.
///
/// # Errors
/// - `AuthError::CredentialsRead` if the file cannot be read.
/// - `AuthError::CredentialsParse` if it is not a key file.
/// - `AuthError::UnsupportedKeyType` for keys other than `service_account`.
pub fn load_service_account_key(
    path: impl AsRef<Path>,
) -> Result<ServiceAccountKey, AuthError> {
    let path = path.as_ref();

    let contents = std::fs::read_to_string(path).map_err(|source| {
        AuthError::CredentialsRead {
            path: path.display().to_string(),
            source,
        }
    })?;

    let key: ServiceAccountKey = serde_json::from_str(&contents)?;

    if key.key_type != "service_account" {
        return Err(AuthError::UnsupportedKeyType(key.key_type));
    }

    tracing::debug!(
        "Loaded service account {} from {}",
        key.client_email,
        path.display()
    );

    Ok(key)
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Secret<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    token: Secret<String>,
    expires_at: Instant,
}

/// Issues and caches bearer tokens for one service account.
pub struct TokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("client_email", &self.key.client_email)
            .field("token_uri", &self.key.token_uri)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl TokenProvider {
    /// Creates a provider for the cloud-platform scope.
    ///
    /// # Errors
    /// `AuthError::InvalidKey` if the private key is not an RSA PEM key.
    pub fn new(
        key: ServiceAccountKey,
        http: reqwest::Client,
    ) -> Result<Self, AuthError> {
        let encoding_key =
            EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
                .map_err(AuthError::InvalidKey)?;

        Ok(Self {
            key,
            encoding_key,
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
            http,
            cached: Mutex::new(None),
        })
    }

    /// Requests tokens for a different OAuth scope.
    #[must_use]
    pub fn scope(self, scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            ..self
        }
    }

    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    /// Returns a valid bearer token, fetching a new one when the cached
    /// token is missing or about to expire.
    ///
    /// # Errors
    /// `AuthError::Signing`, `AuthError::Request` or
    /// `AuthError::TokenEndpoint` when a new token cannot be obtained.
    pub async fn access_token(&self) -> Result<Secret<String>, AuthError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() + REFRESH_MARGIN < token.expires_at {
                return Ok(token.token.clone());
            }
            tracing::debug!("Cached access token is about to expire");
        }

        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);

        Ok(token)
    }

    fn sign_assertion(&self) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);

        let iat = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(AuthError::Signing)
    }

    #[instrument(skip(self), fields(client_email = %self.key.client_email))]
    async fn fetch_token(&self) -> Result<CachedToken, AuthError> {
        let assertion = self.sign_assertion()?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token endpoint returned {}: {}", status, body);

            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token
            .expires_in
            .map_or(Duration::from_secs(3600), Duration::from_secs);

        tracing::info!(
            "Obtained access token valid for {} seconds",
            lifetime.as_secs()
        );

        Ok(CachedToken {
            token: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
