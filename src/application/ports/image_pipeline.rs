//! Image Pipeline Port - 文生图扩散管线抽象（封面）

use async_trait::async_trait;

use super::ModelError;

/// Image Pipeline Port
#[async_trait]
pub trait ImagePipelinePort: Send + Sync {
    fn model_id(&self) -> &str;

    /// 根据提示词生成一张 PNG 图片
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, ModelError>;

    async fn release(&self) -> Result<(), ModelError>;
}
