//! 调用生成接口，把返回的音频写入 `generated.wav`

use music_gen::config::load_config;
use music_gen::infrastructure::client::GenerateClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .init();

    let client = GenerateClient::new(&config.client.endpoint_url, config.client.timeout_secs)?;
    tracing::info!(url = %client.endpoint_url(), "Requesting music, this can take several minutes");

    let outcome = client.generate_to_file(&config.client.output_file).await?;
    println!(
        "Saved {} bytes of audio to '{}'",
        outcome.size,
        outcome.path.display()
    );

    Ok(())
}
