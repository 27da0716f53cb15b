//! HTTP Language Model - 因果语言模型推理后端客户端
//!
//! POST /load     {"model_id", "torch_dtype", "device_map", "cache_dir"}
//! POST /generate {"model_id", "messages": [{"role", "content"}], "max_new_tokens"}
//!                → {"text": "..."}
//! POST /unload   {"model_id"}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::backend::BackendClient;
use crate::application::ports::{ChatMessage, LanguageModelPort, ModelError};

/// 语言模型加载参数
#[derive(Debug, Clone, Serialize)]
pub struct LanguageLoadRequest {
    pub model_id: String,
    pub torch_dtype: String,
    pub device_map: String,
    pub cache_dir: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model_id: &'a str,
    messages: &'a [ChatMessage],
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

/// 已加载的语言模型句柄
pub struct HttpLanguageModel {
    backend: BackendClient,
    model_id: String,
}

impl HttpLanguageModel {
    pub async fn load(backend: BackendClient, request: &LanguageLoadRequest) -> Result<Self, ModelError> {
        tracing::info!(
            backend = %backend.base_url(),
            model = %request.model_id,
            cache_dir = %request.cache_dir,
            "Loading language model"
        );
        backend
            .post_json("load", request)
            .await
            .map_err(|e| ModelError::load_failed(&request.model_id, e))?;
        Ok(Self {
            backend,
            model_id: request.model_id.clone(),
        })
    }
}

#[async_trait]
impl LanguageModelPort for HttpLanguageModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_new_tokens: u32,
    ) -> Result<String, ModelError> {
        let request = CompletionRequest {
            model_id: &self.model_id,
            messages,
            max_new_tokens,
        };
        let response = self.backend.post_json("generate", &request).await?;
        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Bad completion body: {}", e)))?;
        Ok(completion.text)
    }

    async fn release(&self) -> Result<(), ModelError> {
        self.backend
            .post_json("unload", &serde_json::json!({ "model_id": self.model_id }))
            .await
            .map(|_| ())
    }
}
