//! Language Model Port - 因果语言模型抽象

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ModelError;

/// 对话消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Language Model Port
#[async_trait]
pub trait LanguageModelPort: Send + Sync {
    fn model_id(&self) -> &str;

    /// 套用对话模板后自回归生成，返回新生成的文本
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_new_tokens: u32,
    ) -> Result<String, ModelError>;

    async fn release(&self) -> Result<(), ModelError>;
}
