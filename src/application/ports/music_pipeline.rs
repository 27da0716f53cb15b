//! Music Pipeline Port - 文生音频扩散管线抽象

use async_trait::async_trait;
use std::path::Path;

use super::ModelError;
use crate::domain::music::GenerationParams;

/// Music Pipeline Port
#[async_trait]
pub trait MusicPipelinePort: Send + Sync {
    /// 模型标识（用于日志）
    fn model_id(&self) -> &str;

    /// 按参数生成一段音乐，并将 WAV 写入 `save_path`
    async fn generate(&self, params: &GenerationParams, save_path: &Path) -> Result<(), ModelError>;

    /// 释放模型占用的显存
    async fn release(&self) -> Result<(), ModelError>;
}
