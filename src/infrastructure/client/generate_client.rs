//! Generate Client - 调用 `/generate` 并落盘 WAV

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// 调用端错误
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct GenerateResponseBody {
    audio_data: String,
}

/// 一次调用的结果
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub path: PathBuf,
    pub size: usize,
}

/// Generate Client
pub struct GenerateClient {
    client: Client,
    endpoint_url: String,
}

impl GenerateClient {
    pub fn new(endpoint_url: impl Into<String>, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint_url: endpoint_url.into(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    /// 发送空请求体，返回解码后的 WAV 字节
    pub async fn generate(&self) -> Result<Vec<u8>, ClientError> {
        tracing::debug!(url = %self.endpoint_url, "Requesting generation");

        let response = self
            .client
            .post(&self.endpoint_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout
                } else {
                    ClientError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponseBody = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        BASE64
            .decode(body.audio_data.as_bytes())
            .map_err(|e| ClientError::InvalidResponse(format!("audio_data is not Base64: {}", e)))
    }

    /// 生成并写入 `path`
    pub async fn generate_to_file(&self, path: &Path) -> Result<GenerateOutcome, ClientError> {
        let audio = self.generate().await?;
        tokio::fs::write(path, &audio)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(path = %path.display(), size = audio.len(), "Generated audio saved");
        Ok(GenerateOutcome {
            path: path.to_path_buf(),
            size: audio.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ModelHost, ModelHostConfig};
    use crate::domain::audio::is_wav;
    use crate::domain::music::GenerationParams;
    use crate::infrastructure::adapters::models::{FakeModelConfig, FakeModelLoader};
    use crate::infrastructure::http::{build_router, AppState};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// 在随机端口启动带 Fake 模型的服务，返回生成接口 URL
    async fn spawn_server(config: FakeModelConfig, output_dir: &Path) -> String {
        let loader = Arc::new(FakeModelLoader::new(config));
        let host = Arc::new(ModelHost::new(loader, ModelHostConfig::default()));
        let state = AppState::new(host, output_dir, GenerationParams::default());
        let router = build_router(Arc::new(state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/generate", addr)
    }

    #[tokio::test]
    async fn test_generate_to_file_writes_wav() {
        let server_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let url = spawn_server(FakeModelConfig::default(), server_dir.path()).await;

        let client = GenerateClient::new(url, 30).unwrap();
        let output = out_dir.path().join("generated.wav");
        let outcome = client.generate_to_file(&output).await.unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(is_wav(&bytes));
        assert_eq!(bytes.len(), outcome.size);
    }

    #[tokio::test]
    async fn test_server_error_surfaces_status() {
        let server_dir = tempfile::tempdir().unwrap();
        let url = spawn_server(
            FakeModelConfig {
                fail_load: true,
                ..Default::default()
            },
            server_dir.path(),
        )
        .await;

        let client = GenerateClient::new(url, 30).unwrap();
        let err = client.generate().await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 503, .. }));
    }
}
