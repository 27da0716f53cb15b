//! 把 `generated.wav` 转为同目录下 192 kbps 的 `generated.mp3`

use std::process::ExitCode;
use std::sync::Arc;

use music_gen::application::{ConvertAudioCommand, ConvertAudioHandler};
use music_gen::config::load_config;
use music_gen::infrastructure::adapters::transcoder::Mp3Transcoder;

fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let handler = ConvertAudioHandler::new(
        Arc::new(Mp3Transcoder::new()),
        config.converter.bitrate_kbps,
    );
    let cmd = ConvertAudioCommand {
        input: config.converter.input_file.clone(),
    };

    match runtime.block_on(handler.handle(cmd)) {
        Ok(result) => {
            println!(
                "Successfully converted '{}' to '{}'",
                result.input.display(),
                result.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
