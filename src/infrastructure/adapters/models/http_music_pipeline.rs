//! HTTP Music Pipeline - ACE-Step 推理后端客户端
//!
//! POST /load     {"checkpoint_dir", "dtype", "torch_compile", "cpu_offload", "overlapped_decode"}
//! POST /generate {"prompt", "lyrics", "audio_duration", "infer_step", "guidance_scale", "seed"}
//!                → audio/wav
//! POST /unload   {}

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

use super::backend::BackendClient;
use crate::application::ports::{ModelError, MusicPipelinePort};
use crate::domain::music::GenerationParams;

/// ACE-Step 加载参数
#[derive(Debug, Clone, Serialize)]
pub struct MusicLoadRequest {
    pub checkpoint_dir: String,
    pub dtype: String,
    pub torch_compile: bool,
    pub cpu_offload: bool,
    pub overlapped_decode: bool,
}

#[derive(Debug, Serialize)]
struct MusicGenerateRequest<'a> {
    prompt: &'a str,
    lyrics: &'a str,
    audio_duration: f64,
    infer_step: u32,
    guidance_scale: f64,
    seed: Option<u64>,
}

/// 已加载的 ACE-Step 管线句柄
pub struct HttpMusicPipeline {
    backend: BackendClient,
    model_id: String,
}

impl HttpMusicPipeline {
    /// 请求后端加载管线
    pub async fn load(
        backend: BackendClient,
        model_id: impl Into<String>,
        request: &MusicLoadRequest,
    ) -> Result<Self, ModelError> {
        let model_id = model_id.into();
        tracing::info!(
            backend = %backend.base_url(),
            checkpoint_dir = %request.checkpoint_dir,
            dtype = %request.dtype,
            "Loading music pipeline"
        );
        backend
            .post_json("load", request)
            .await
            .map_err(|e| ModelError::load_failed(&model_id, e))?;
        Ok(Self { backend, model_id })
    }
}

#[async_trait]
impl MusicPipelinePort for HttpMusicPipeline {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, params: &GenerationParams, save_path: &Path) -> Result<(), ModelError> {
        let request = MusicGenerateRequest {
            prompt: &params.prompt,
            lyrics: &params.lyrics,
            audio_duration: params.audio_duration,
            infer_step: params.infer_step,
            guidance_scale: params.guidance_scale,
            seed: params.seed,
        };

        let response = self.backend.post_json("generate", &request).await?;
        let audio = BackendClient::read_bytes(response).await?;
        if audio.is_empty() {
            return Err(ModelError::InvalidResponse(
                "music backend returned no audio".to_string(),
            ));
        }

        tokio::fs::write(save_path, &audio).await.map_err(|e| {
            ModelError::Backend(format!("Failed to save audio to {}: {}", save_path.display(), e))
        })?;

        tracing::debug!(
            path = %save_path.display(),
            size = audio.len(),
            "Music pipeline output saved"
        );
        Ok(())
    }

    async fn release(&self) -> Result<(), ModelError> {
        self.backend
            .post_json("unload", &serde_json::json!({}))
            .await
            .map(|_| ())
    }
}
