//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, ModelBackend};
use crate::application::ports::SUPPORTED_MP3_BITRATES;
use crate::domain::music::{
    DEFAULT_AUDIO_DURATION_SECS, DEFAULT_GUIDANCE_SCALE, DEFAULT_INFER_STEP, DEFAULT_LYRICS,
    DEFAULT_PROMPT,
};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "MUSICGEN";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `MUSICGEN_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `MUSICGEN_SERVER__PORT=8080`
/// - `MUSICGEN_MODELS__BACKEND=fake`
/// - `MUSICGEN_MODELS__MUSIC_URL=http://gpu-box:9001`
/// - `MUSICGEN_MODELS__API_KEY=...`
/// - `MUSICGEN_LIFECYCLE__IDLE_TEARDOWN_SECS=60`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("models.backend", "http")?
        .set_default("models.music_url", "http://localhost:9001")?
        .set_default("models.language_url", "http://localhost:9002")?
        .set_default("models.image_url", "http://localhost:9003")?
        .set_default("models.checkpoint_dir", "/models")?
        .set_default("models.cache_home", "/.cache/huggingface")?
        .set_default("models.music_dtype", "bfloat16")?
        .set_default("models.language_model_id", "Qwen/Qwen2-7B-Instruct")?
        .set_default("models.image_model_id", "stabilityai/sdxl-turbo")?
        .set_default("models.timeout_secs", 600)?
        .set_default("lifecycle.idle_teardown_secs", 15)?
        .set_default("lifecycle.reap_interval_secs", 5)?
        .set_default("lifecycle.preload", true)?
        .set_default("generation.prompt", DEFAULT_PROMPT)?
        .set_default("generation.lyrics", DEFAULT_LYRICS)?
        .set_default("generation.audio_duration", DEFAULT_AUDIO_DURATION_SECS)?
        .set_default("generation.infer_step", DEFAULT_INFER_STEP)?
        .set_default("generation.guidance_scale", DEFAULT_GUIDANCE_SCALE)?
        .set_default("generation.output_dir", "/tmp/outputs")?
        .set_default("client.endpoint_url", "http://localhost:8000/generate")?
        .set_default("client.output_file", "generated.wav")?
        .set_default("client.timeout_secs", 900)?
        .set_default("converter.input_file", "generated.wav")?
        .set_default("converter.bitrate_kbps", 192)?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: MUSICGEN_MODELS__MUSIC_URL=http://gpu-box:9001
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.models.backend == ModelBackend::Http {
        let urls = [
            ("music_url", &config.models.music_url),
            ("language_url", &config.models.language_url),
            ("image_url", &config.models.image_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "models.{} cannot be empty when backend is http",
                    name
                )));
            }
        }
    }

    if config.lifecycle.reap_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Reap interval cannot be 0".to_string(),
        ));
    }

    config.generation.params().validate().map_err(|e| {
        ConfigError::ValidationError(format!("Invalid default generation parameters: {}", e))
    })?;

    if !SUPPORTED_MP3_BITRATES.contains(&config.converter.bitrate_kbps) {
        return Err(ConfigError::ValidationError(format!(
            "Unsupported MP3 bitrate {} kbps, expected one of {:?}",
            config.converter.bitrate_kbps, SUPPORTED_MP3_BITRATES
        )));
    }

    if config.client.endpoint_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Client endpoint URL cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Model Backend: {:?}", config.models.backend);
    if config.models.backend == ModelBackend::Http {
        tracing::info!("Music Backend: {}", config.models.music_url);
        tracing::info!("Language Backend: {}", config.models.language_url);
        tracing::info!("Image Backend: {}", config.models.image_url);
        tracing::info!("Backend Timeout: {}s", config.models.timeout_secs);
        tracing::info!("API Key: {}", if config.models.api_key.is_some() { "set" } else { "not set" });
    }
    tracing::info!("Checkpoint Dir: {}", config.models.checkpoint_dir);
    tracing::info!("Cache Home: {}", config.models.cache_home);
    tracing::info!("Language Model: {}", config.models.language_model_id);
    tracing::info!("Image Model: {}", config.models.image_model_id);
    tracing::info!("Idle Teardown: {}s", config.lifecycle.idle_teardown_secs);
    tracing::info!("Preload: {}", config.lifecycle.preload);
    tracing::info!("Output Directory: {:?}", config.generation.output_dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_backend_url() {
        let mut config = AppConfig::default();
        config.models.image_url = String::new();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("image_url"));

        // fake 后端不需要 URL
        config.models.backend = ModelBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_reap_interval() {
        let mut config = AppConfig::default();
        config.lifecycle.reap_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_generation_defaults() {
        let mut config = AppConfig::default();
        config.generation.audio_duration = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unsupported_bitrate() {
        let mut config = AppConfig::default();
        config.converter.bitrate_kbps = 100;
        assert!(validate_config(&config).is_err());
        config.converter.bitrate_kbps = 320;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_then_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[models]
backend = "fake"

[lifecycle]
idle_teardown_secs = 30
"#,
        )
        .unwrap();

        std::env::set_var("MUSICGEN_LIFECYCLE__IDLE_TEARDOWN_SECS", "45");
        let config = load_config_from_path(Some(&path));
        std::env::remove_var("MUSICGEN_LIFECYCLE__IDLE_TEARDOWN_SECS");
        let config = config.unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.models.backend, ModelBackend::Fake);
        assert_eq!(config.lifecycle.idle_teardown_secs, 45);
        // 未覆盖的字段保持默认
        assert_eq!(config.lifecycle.reap_interval_secs, 5);
        assert_eq!(config.generation.infer_step, 60);
        assert_eq!(config.converter.bitrate_kbps, 192);
    }
}
