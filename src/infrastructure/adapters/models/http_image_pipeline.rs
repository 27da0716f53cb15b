//! HTTP Image Pipeline - 文生图推理后端客户端
//!
//! POST /load     {"model_id", "torch_dtype", "variant", "cache_dir", "device"}
//! POST /generate {"prompt", "num_inference_steps", "guidance_scale"} → image/png
//! POST /unload   {"model_id"}

use async_trait::async_trait;
use serde::Serialize;

use super::backend::BackendClient;
use crate::application::ports::{ImagePipelinePort, ModelError};

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const RENDER_STEPS: u32 = 2;

/// 文生图加载参数
#[derive(Debug, Clone, Serialize)]
pub struct ImageLoadRequest {
    pub model_id: String,
    pub torch_dtype: String,
    pub variant: String,
    pub cache_dir: String,
    pub device: String,
}

/// SDXL-Turbo 少步采样、无 guidance
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    prompt: &'a str,
    num_inference_steps: u32,
    guidance_scale: f64,
}

/// 已加载的文生图管线句柄
pub struct HttpImagePipeline {
    backend: BackendClient,
    model_id: String,
}

impl HttpImagePipeline {
    pub async fn load(backend: BackendClient, request: &ImageLoadRequest) -> Result<Self, ModelError> {
        tracing::info!(
            backend = %backend.base_url(),
            model = %request.model_id,
            device = %request.device,
            "Loading image pipeline"
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
impl ImagePipelinePort for HttpImagePipeline {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn render(&self, prompt: &str) -> Result<Vec<u8>, ModelError> {
        let request = RenderRequest {
            prompt,
            num_inference_steps: RENDER_STEPS,
            guidance_scale: 0.0,
        };
        let response = self.backend.post_json("generate", &request).await?;
        let image = BackendClient::read_bytes(response).await?;
        if !image.starts_with(PNG_SIGNATURE) {
            return Err(ModelError::InvalidResponse(
                "image backend did not return a PNG".to_string(),
            ));
        }
        Ok(image)
    }

    async fn release(&self) -> Result<(), ModelError> {
        self.backend
            .post_json("unload", &serde_json::json!({ "model_id": self.model_id }))
            .await
            .map(|_| ())
    }
}
