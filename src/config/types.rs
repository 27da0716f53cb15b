//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::music::{
    GenerationParams, DEFAULT_AUDIO_DURATION_SECS, DEFAULT_GUIDANCE_SCALE, DEFAULT_INFER_STEP,
    DEFAULT_LYRICS, DEFAULT_PROMPT,
};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 推理后端配置
    #[serde(default)]
    pub models: ModelsConfig,

    /// 模型生命周期配置
    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    /// 生成默认参数
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 生成接口调用端配置
    #[serde(default)]
    pub client: ClientConfig,

    /// WAV → MP3 转换配置
    #[serde(default)]
    pub converter: ConverterConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 推理后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// 远程 GPU 推理后端
    #[default]
    Http,
    /// 本地 Fake 模型（无 GPU 开发环境）
    Fake,
}

/// 推理后端配置
#[derive(Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub backend: ModelBackend,

    #[serde(default = "default_music_url")]
    pub music_url: String,

    #[serde(default = "default_language_url")]
    pub language_url: String,

    #[serde(default = "default_image_url")]
    pub image_url: String,

    /// 后端 Bearer token
    #[serde(default)]
    pub api_key: Option<String>,

    /// ACE-Step 权重目录
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    /// HuggingFace 缓存目录
    #[serde(default = "default_cache_home")]
    pub cache_home: String,

    #[serde(default = "default_music_dtype")]
    pub music_dtype: String,

    #[serde(default = "default_language_model_id")]
    pub language_model_id: String,

    #[serde(default = "default_image_model_id")]
    pub image_model_id: String,

    /// 单次后端请求超时（秒）
    #[serde(default = "default_models_timeout")]
    pub timeout_secs: u64,
}

fn default_music_url() -> String {
    "http://localhost:9001".to_string()
}

fn default_language_url() -> String {
    "http://localhost:9002".to_string()
}

fn default_image_url() -> String {
    "http://localhost:9003".to_string()
}

fn default_checkpoint_dir() -> String {
    "/models".to_string()
}

fn default_cache_home() -> String {
    "/.cache/huggingface".to_string()
}

fn default_music_dtype() -> String {
    "bfloat16".to_string()
}

fn default_language_model_id() -> String {
    "Qwen/Qwen2-7B-Instruct".to_string()
}

fn default_image_model_id() -> String {
    "stabilityai/sdxl-turbo".to_string()
}

fn default_models_timeout() -> u64 {
    600
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::default(),
            music_url: default_music_url(),
            language_url: default_language_url(),
            image_url: default_image_url(),
            api_key: None,
            checkpoint_dir: default_checkpoint_dir(),
            cache_home: default_cache_home(),
            music_dtype: default_music_dtype(),
            language_model_id: default_language_model_id(),
            image_model_id: default_image_model_id(),
            timeout_secs: default_models_timeout(),
        }
    }
}

// api_key 不进入日志
impl std::fmt::Debug for ModelsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelsConfig")
            .field("backend", &self.backend)
            .field("music_url", &self.music_url)
            .field("language_url", &self.language_url)
            .field("image_url", &self.image_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("checkpoint_dir", &self.checkpoint_dir)
            .field("cache_home", &self.cache_home)
            .field("music_dtype", &self.music_dtype)
            .field("language_model_id", &self.language_model_id)
            .field("image_model_id", &self.image_model_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 模型生命周期配置
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// 空闲多久后释放模型（秒）
    #[serde(default = "default_idle_teardown")]
    pub idle_teardown_secs: u64,

    /// 空闲检查间隔（秒）
    #[serde(default = "default_reap_interval")]
    pub reap_interval_secs: u64,

    /// 启动时预加载模型
    #[serde(default = "default_preload")]
    pub preload: bool,
}

fn default_idle_teardown() -> u64 {
    15
}

fn default_reap_interval() -> u64 {
    5
}

fn default_preload() -> bool {
    true
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            idle_teardown_secs: default_idle_teardown(),
            reap_interval_secs: default_reap_interval(),
            preload: default_preload(),
        }
    }
}

impl LifecycleConfig {
    pub fn idle_teardown(&self) -> Duration {
        Duration::from_secs(self.idle_teardown_secs)
    }

    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

/// 生成默认参数
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_prompt")]
    pub prompt: String,

    #[serde(default = "default_lyrics")]
    pub lyrics: String,

    /// 时长（秒）
    #[serde(default = "default_audio_duration")]
    pub audio_duration: f64,

    #[serde(default = "default_infer_step")]
    pub infer_step: u32,

    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,

    /// 固定种子；不设置则每次随机
    #[serde(default)]
    pub seed: Option<u64>,

    /// 临时输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_lyrics() -> String {
    DEFAULT_LYRICS.to_string()
}

fn default_audio_duration() -> f64 {
    DEFAULT_AUDIO_DURATION_SECS
}

fn default_infer_step() -> u32 {
    DEFAULT_INFER_STEP
}

fn default_guidance_scale() -> f64 {
    DEFAULT_GUIDANCE_SCALE
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("/tmp/outputs")
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            lyrics: default_lyrics(),
            audio_duration: default_audio_duration(),
            infer_step: default_infer_step(),
            guidance_scale: default_guidance_scale(),
            seed: None,
            output_dir: default_output_dir(),
        }
    }
}

impl GenerationConfig {
    /// 转为生成参数
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            prompt: self.prompt.clone(),
            lyrics: self.lyrics.clone(),
            audio_duration: self.audio_duration,
            infer_step: self.infer_step,
            guidance_scale: self.guidance_scale,
            seed: self.seed,
        }
    }
}

/// 生成接口调用端配置
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// 生成接口 URL
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// 输出文件
    #[serde(default = "default_client_output")]
    pub output_file: PathBuf,

    /// 请求超时（秒），需覆盖冷启动与推理时间
    #[serde(default = "default_client_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint_url() -> String {
    "http://localhost:8000/generate".to_string()
}

fn default_client_output() -> PathBuf {
    PathBuf::from("generated.wav")
}

fn default_client_timeout() -> u64 {
    900
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            output_file: default_client_output(),
            timeout_secs: default_client_timeout(),
        }
    }
}

/// WAV → MP3 转换配置
#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    #[serde(default = "default_converter_input")]
    pub input_file: PathBuf,

    /// 恒定比特率（kbps）
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: u32,
}

fn default_converter_input() -> PathBuf {
    PathBuf::from("generated.wav")
}

fn default_bitrate_kbps() -> u32 {
    192
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            input_file: default_converter_input(),
            bitrate_kbps: default_bitrate_kbps(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.models.backend, ModelBackend::Http);
        assert_eq!(config.models.language_model_id, "Qwen/Qwen2-7B-Instruct");
        assert_eq!(config.lifecycle.idle_teardown(), Duration::from_secs(15));
        assert_eq!(config.converter.bitrate_kbps, 192);
        assert_eq!(config.client.output_file, PathBuf::from("generated.wav"));
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_generation_defaults_match_fixed_params() {
        assert_eq!(GenerationConfig::default().params(), GenerationParams::default());
    }

    #[test]
    fn test_api_key_is_redacted() {
        let config = ModelsConfig {
            api_key: Some("hf_secret".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("hf_secret"));
    }
}
