use std::process::ExitCode;

use app_context::{CloudContext, ContextProvider};
use audio_transcriber::{Config, Transcriber};
use speech_client::SpeechClient;

struct AppContext {
    transcriber: Transcriber,
}

impl ContextProvider<Config> for AppContext {
    fn new(config: Config, cloud: CloudContext) -> Self {
        let speech = SpeechClient::new(cloud.http, cloud.tokens)
            .endpoint(&config.speech_endpoint);

        let transcriber =
            Transcriber::new(speech, config.recognition_settings())
                .poll_options(config.poll_options())
                .assemble_options(config.assemble_options())
                .results_dir(config.results_dir);

        Self { transcriber }
    }
}

/**
 * Submits the audio object at `<source_uri>` for recognition, waits for
 * the job, and writes the subtitles to
 * `$RESULTS_DIR/<output_name_hint><unix seconds>.srt`.
 *
 * Exits with status 1 on bad arguments or any failure.
 */
#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <source_uri> <output_name_hint>", args[0]);
        return ExitCode::FAILURE;
    }
    let source_uri = &args[1];
    let output_name_hint = &args[2];

    let context: AppContext =
        match app_context::create_app_context::<AppContext, Config>() {
            Ok(context) => context,
            Err(err) => {
                tracing::error!("Failed to start: {}", err);
                return ExitCode::FAILURE;
            }
        };

    tracing::info!("Transcribing {}", source_uri);

    match context
        .transcriber
        .transcribe(source_uri, output_name_hint)
        .await
    {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("Transcription failed: {}", err);
            ExitCode::FAILURE
        }
    }
}
