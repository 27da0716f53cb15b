//! HTTP Model Loader - 依次在三个推理后端上加载模型

use async_trait::async_trait;
use std::sync::Arc;

use super::backend::{BackendClient, BackendConfig};
use super::http_image_pipeline::{HttpImagePipeline, ImageLoadRequest};
use super::http_language_model::{HttpLanguageModel, LanguageLoadRequest};
use super::http_music_pipeline::{HttpMusicPipeline, MusicLoadRequest};
use crate::application::ports::{
    ImagePipelinePort, LanguageModelPort, LoadedModels, ModelError, ModelLoaderPort,
    MusicPipelinePort,
};
use crate::config::ModelsConfig;

/// ACE-Step 管线在日志与状态中的名字
pub const MUSIC_MODEL_ID: &str = "ACE-Step/ACE-Step-v1-3.5B";

/// 三个推理后端的地址与加载参数
#[derive(Debug, Clone)]
pub struct HttpModelsConfig {
    pub music_url: String,
    pub language_url: String,
    pub image_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// ACE-Step 权重目录（挂载的模型卷）
    pub checkpoint_dir: String,
    /// HuggingFace 缓存目录
    pub cache_home: String,
    pub music_dtype: String,
    pub language_model_id: String,
    pub image_model_id: String,
}

impl Default for HttpModelsConfig {
    fn default() -> Self {
        Self {
            music_url: "http://localhost:9001".to_string(),
            language_url: "http://localhost:9002".to_string(),
            image_url: "http://localhost:9003".to_string(),
            api_key: None,
            timeout_secs: 600,
            checkpoint_dir: "/models".to_string(),
            cache_home: "/.cache/huggingface".to_string(),
            music_dtype: "bfloat16".to_string(),
            language_model_id: "Qwen/Qwen2-7B-Instruct".to_string(),
            image_model_id: "stabilityai/sdxl-turbo".to_string(),
        }
    }
}

impl HttpModelsConfig {
    /// 由 `[models]` 配置节构建；空的 api_key 视为未设置
    pub fn from_settings(settings: &ModelsConfig) -> Self {
        Self {
            music_url: settings.music_url.clone(),
            language_url: settings.language_url.clone(),
            image_url: settings.image_url.clone(),
            api_key: settings.api_key.clone().filter(|key| !key.is_empty()),
            timeout_secs: settings.timeout_secs,
            checkpoint_dir: settings.checkpoint_dir.clone(),
            cache_home: settings.cache_home.clone(),
            music_dtype: settings.music_dtype.clone(),
            language_model_id: settings.language_model_id.clone(),
            image_model_id: settings.image_model_id.clone(),
        }
    }

    fn backend(&self, base_url: &str) -> Result<BackendClient, ModelError> {
        BackendClient::new(
            BackendConfig::new(base_url)
                .with_timeout(self.timeout_secs)
                .with_api_key(self.api_key.clone()),
        )
    }

    fn music_request(&self) -> MusicLoadRequest {
        MusicLoadRequest {
            checkpoint_dir: self.checkpoint_dir.clone(),
            dtype: self.music_dtype.clone(),
            torch_compile: false,
            cpu_offload: false,
            overlapped_decode: false,
        }
    }

    fn language_request(&self) -> LanguageLoadRequest {
        LanguageLoadRequest {
            model_id: self.language_model_id.clone(),
            torch_dtype: "auto".to_string(),
            device_map: "auto".to_string(),
            cache_dir: self.cache_home.clone(),
        }
    }

    fn image_request(&self) -> ImageLoadRequest {
        ImageLoadRequest {
            model_id: self.image_model_id.clone(),
            torch_dtype: "float16".to_string(),
            variant: "fp16".to_string(),
            cache_dir: self.cache_home.clone(),
            device: "cuda".to_string(),
        }
    }
}

/// HTTP Model Loader
pub struct HttpModelLoader {
    config: HttpModelsConfig,
}

impl HttpModelLoader {
    pub fn new(config: HttpModelsConfig) -> Self {
        Self { config }
    }
}

fn log_release_failure(model_id: &str, result: Result<(), ModelError>) {
    if let Err(e) = result {
        tracing::warn!(model = %model_id, error = %e, "Failed to release partially loaded model");
    }
}

#[async_trait]
impl ModelLoaderPort for HttpModelLoader {
    async fn load(&self) -> Result<LoadedModels, ModelError> {
        let config = &self.config;

        let music = HttpMusicPipeline::load(
            config.backend(&config.music_url)?,
            MUSIC_MODEL_ID,
            &config.music_request(),
        )
        .await?;

        let language = match config.backend(&config.language_url) {
            Ok(backend) => HttpLanguageModel::load(backend, &config.language_request()).await,
            Err(e) => Err(e),
        };
        let language = match language {
            Ok(language) => language,
            Err(e) => {
                log_release_failure(music.model_id(), music.release().await);
                return Err(e);
            }
        };

        let image = match config.backend(&config.image_url) {
            Ok(backend) => HttpImagePipeline::load(backend, &config.image_request()).await,
            Err(e) => Err(e),
        };
        let image = match image {
            Ok(image) => image,
            Err(e) => {
                log_release_failure(language.model_id(), language.release().await);
                log_release_failure(music.model_id(), music.release().await);
                return Err(e);
            }
        };

        Ok(LoadedModels {
            music: Arc::new(music) as Arc<dyn MusicPipelinePort>,
            language: Arc::new(language) as Arc<dyn LanguageModelPort>,
            image: Arc::new(image) as Arc<dyn ImagePipelinePort>,
        })
    }
}
