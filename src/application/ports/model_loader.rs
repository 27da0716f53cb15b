//! Model Loader Port - 模型句柄的加载与释放
//!
//! 冷启动时一次性获取三个模型句柄，空闲超时或进程退出时显式释放

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::{ImagePipelinePort, LanguageModelPort, MusicPipelinePort};

/// 模型调用错误
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to load {model}: {reason}")]
    LoadFailed { model: String, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Models unavailable: {0}")]
    Unavailable(String),
}

impl ModelError {
    pub fn load_failed(model: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// 常驻内存的三个模型句柄
#[derive(Clone)]
pub struct LoadedModels {
    /// 文生音频扩散管线
    pub music: Arc<dyn MusicPipelinePort>,
    /// 因果语言模型（含分词器）
    pub language: Arc<dyn LanguageModelPort>,
    /// 文生图扩散管线
    pub image: Arc<dyn ImagePipelinePort>,
}

impl LoadedModels {
    /// 依次释放全部句柄
    ///
    /// 单个句柄释放失败只记录日志，不影响其余句柄
    pub async fn release_all(&self) {
        if let Err(e) = self.music.release().await {
            tracing::warn!(model = %self.music.model_id(), error = %e, "Failed to release music pipeline");
        }
        if let Err(e) = self.language.release().await {
            tracing::warn!(model = %self.language.model_id(), error = %e, "Failed to release language model");
        }
        if let Err(e) = self.image.release().await {
            tracing::warn!(model = %self.image.model_id(), error = %e, "Failed to release image pipeline");
        }
    }
}

impl std::fmt::Debug for LoadedModels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModels")
            .field("music", &self.music.model_id())
            .field("language", &self.language.model_id())
            .field("image", &self.image.model_id())
            .finish()
    }
}

/// Model Loader Port
#[async_trait]
pub trait ModelLoaderPort: Send + Sync {
    /// 加载全部模型
    ///
    /// 任一模型加载失败时，已加载的句柄必须先释放再返回错误
    async fn load(&self) -> Result<LoadedModels, ModelError>;
}
