use std::path::{Path, PathBuf};
use std::process::ExitCode;

use app_context::{CloudContext, CloudSettings, ContextProvider};
use serde::Deserialize;
use storage_client::StorageClient;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_storage_endpoint() -> String {
    storage_client::DEFAULT_ENDPOINT.to_string()
}

fn default_user_agent() -> String {
    "speech-subtitles/0.1".to_string()
}

impl CloudSettings for Config {
    fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[derive(Debug)]
pub struct AppContext {
    pub storage: StorageClient,
}

impl ContextProvider<Config> for AppContext {
    fn new(config: Config, cloud: CloudContext) -> Self {
        let storage = StorageClient::new(cloud.http, cloud.tokens)
            .endpoint(&config.storage_endpoint);

        Self { storage }
    }
}

/**
 * Streams `<local_path>` into `<bucket>` under `<key>`, so that it can be
 * handed to `audio_transcriber` as `gs://<bucket>/<key>`.
 */
#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 4 {
        eprintln!("Usage: {} <bucket> <key> <local_path>", args[0]);
        return ExitCode::FAILURE;
    }
    let bucket = &args[1];
    let key = &args[2];
    let local_path = Path::new(&args[3]);

    let context: AppContext =
        match app_context::create_app_context::<AppContext, Config>() {
            Ok(context) => context,
            Err(err) => {
                tracing::error!("Failed to start: {}", err);
                return ExitCode::FAILURE;
            }
        };

    match context.storage.upload_object(bucket, key, local_path).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Upload failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
