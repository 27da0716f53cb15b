//! Music Gen - 文生音乐推理服务
//!
//! 启动流程：加载配置 → 创建模型加载器 → 预热模型 → 启动空闲回收 → HTTP 服务

use std::sync::Arc;

use music_gen::application::{ModelHost, ModelHostConfig, ModelLoaderPort};
use music_gen::config::{load_config, print_config, AppConfig, ModelBackend};
use music_gen::infrastructure::adapters::models::{
    FakeModelConfig, FakeModelLoader, HttpModelLoader, HttpModelsConfig,
};
use music_gen::infrastructure::http::{AppState, HttpServer};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},music_gen={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();
}

fn create_loader(config: &AppConfig) -> Arc<dyn ModelLoaderPort> {
    match config.models.backend {
        ModelBackend::Http => Arc::new(HttpModelLoader::new(HttpModelsConfig::from_settings(
            &config.models,
        ))),
        ModelBackend::Fake => {
            tracing::warn!("Using fake models, generated audio is a test tone");
            Arc::new(FakeModelLoader::new(FakeModelConfig::default()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Music Gen - 文生音乐推理服务");
    print_config(&config);

    tokio::fs::create_dir_all(&config.generation.output_dir).await?;

    let model_host = Arc::new(ModelHost::new(
        create_loader(&config),
        ModelHostConfig {
            idle_teardown: config.lifecycle.idle_teardown(),
        },
    ));

    // 预热失败视为启动失败
    if config.lifecycle.preload {
        model_host
            .warm_up()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load models: {}", e))?;
    }

    let reaper = model_host.spawn_idle_reaper(config.lifecycle.reap_interval());

    let state = AppState::new(
        model_host.clone(),
        config.generation.output_dir.clone(),
        config.generation.params(),
    );
    let server = HttpServer::new(config.server.clone(), state);

    let served = server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await;

    model_host.shutdown().await;
    if let Err(e) = reaper.await {
        tracing::warn!(error = %e, "Idle reaper did not stop cleanly");
    }

    served?;
    tracing::info!("Server shutdown complete");

    Ok(())
}
