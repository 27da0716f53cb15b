//! Backend Client - 模型推理后端的 HTTP 通用客户端
//!
//! 每个模型后端暴露相同的三个接口：
//! - POST {base_url}/load     加载模型
//! - POST {base_url}/generate 推理
//! - POST {base_url}/unload   释放模型

use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::ModelError;

/// 后端连接配置
#[derive(Clone)]
pub struct BackendConfig {
    /// 后端基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// Bearer token
    pub api_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout_secs: 600,
            api_key: None,
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

/// 后端 HTTP 客户端
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    config: BackendConfig,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 发送 JSON POST 请求，非 2xx 视为后端错误
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, ModelError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "Sending backend request");

        let mut request = self.client.post(&url).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout
            } else if e.is_connect() {
                ModelError::Network(format!("Cannot connect to model backend {}: {}", url, e))
            } else {
                ModelError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Backend(format!(
                "{} returned HTTP {}: {}",
                url, status, error_text
            )));
        }

        Ok(response)
    }

    /// 读取完整响应体
    pub async fn read_bytes(response: Response) -> Result<Vec<u8>, ModelError> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to read body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = BackendConfig::new("http://gpu-box:9001")
            .with_timeout(60)
            .with_api_key(Some("secret".to_string()));
        assert_eq!(config.base_url, "http://gpu-box:9001");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_url_join_tolerates_trailing_slash() {
        let client = BackendClient::new(BackendConfig::new("http://gpu-box:9001/")).unwrap();
        assert_eq!(client.url("generate"), "http://gpu-box:9001/generate");
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_network_error() {
        // 端口 9 (discard) 通常无人监听
        let client = BackendClient::new(BackendConfig::new("http://127.0.0.1:9").with_timeout(2)).unwrap();
        let err = client.post_json("load", &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ModelError::Network(_) | ModelError::Timeout));
    }
}
