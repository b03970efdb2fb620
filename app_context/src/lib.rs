use std::path::Path;
use std::sync::Arc;

use figment::{Figment, providers::Env};
use google_auth::{AuthError, TokenProvider};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] figment::Error),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Settings every job needs to reach Google Cloud.
pub trait CloudSettings {
    /// Location of the service account JSON key file.
    fn credentials_path(&self) -> &Path;

    fn user_agent(&self) -> &str;
}

/// Authenticated plumbing shared by the API clients of one process.
#[derive(Debug, Clone)]
pub struct CloudContext {
    pub http: reqwest::Client,
    pub tokens: Arc<TokenProvider>,
}

impl CloudContext {
    /// Loads the service account key and builds the HTTP client.
    ///
    /// # Errors
    /// If the key cannot be loaded or the client cannot be built.
    pub fn from_settings(
        settings: &impl CloudSettings,
    ) -> Result<Self, AppError> {
        let key =
            google_auth::load_service_account_key(settings.credentials_path())?;

        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent())
            .build()?;

        let tokens = TokenProvider::new(key, http.clone())?;

        tracing::info!(
            "Authenticating as {} (project {})",
            tokens.client_email(),
            tokens.project_id().unwrap_or("unknown")
        );

        Ok(Self {
            http,
            tokens: Arc::new(tokens),
        })
    }
}

pub trait ContextProvider<Config> {
    fn new(config: Config, cloud: CloudContext) -> Self;
}

/// Installs the global tracing subscriber. The log level defaults to
/// `info` and can be overridden with `RUST_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Extracts the job configuration from the process environment.
///
/// # Errors
/// If a variable cannot be converted into the configured field type.
pub fn load_config<Config: serde::de::DeserializeOwned>()
-> Result<Config, figment::Error> {
    let figment = Figment::new().merge(Env::raw());

    figment.extract()
}

/// Initialize the application context with configuration from environment
/// variables and the service account key file the configuration names.
///
/// # Errors
/// If the configuration cannot be extracted from the environment, or the
/// credentials cannot be loaded.
pub fn create_app_context<A, Config>() -> Result<A, AppError>
where
    Config: serde::de::DeserializeOwned + CloudSettings,
    A: ContextProvider<Config>,
{
    init_tracing();

    let config: Config = load_config()?;
    let cloud = CloudContext::from_settings(&config)?;

    Ok(A::new(config, cloud))
}
