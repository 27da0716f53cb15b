//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::ServerConfig;

/// 请求体上限，生成参数只有几个字段
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 构建带中间件的 Router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    create_routes()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(error_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state.clone());
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ModelHost, ModelHostConfig};
    use crate::domain::music::GenerationParams;
    use crate::infrastructure::adapters::models::{FakeModelConfig, FakeModelLoader};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde_json::Value;
    use std::path::Path;
    use tower::util::ServiceExt;

    fn test_router(config: FakeModelConfig, output_dir: &Path) -> (Arc<ModelHost>, Router) {
        let loader = Arc::new(FakeModelLoader::new(config));
        let host = Arc::new(ModelHost::new(loader, ModelHostConfig::default()));
        let state = AppState::new(host.clone(), output_dir, GenerationParams::default());
        (host, build_router(Arc::new(state)))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_generate(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let (_host, router) = test_router(FakeModelConfig::default(), dir.path());

        let (status, json) = send(router, post_generate("")).await;

        assert_eq!(status, StatusCode::OK);
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), 1);
        let audio = BASE64.decode(json["audio_data"].as_str().unwrap()).unwrap();
        assert_eq!(&audio[0..4], b"RIFF");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_generate_with_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let (_host, router) = test_router(FakeModelConfig::default(), dir.path());

        let (status, json) = send(router, post_generate("{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["audio_data"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[tokio::test]
    async fn test_generate_from_full_description_lists_categories() {
        let dir = tempfile::tempdir().unwrap();
        let (_host, router) = test_router(FakeModelConfig::default(), dir.path());

        let body = r#"{"full_described_song": "a chill lofi track about rain", "instrumental": false}"#;
        let (status, json) = send(router, post_generate(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["audio_data"].as_str().is_some_and(|s| !s.is_empty()));
        assert_eq!(json["categories"], serde_json::json!(["Lofi", "Chill", "Ambient"]));
        assert!(json.get("cover_image_data").is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_parameters_return_400_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let (host, router) = test_router(FakeModelConfig::default(), dir.path());

        let (status, json) = send(router, post_generate(r#"{"audio_duration": -1}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errno"], 400);
        assert!(json["data"].is_null());
        assert!(!host.is_loaded().await);
    }

    #[tokio::test]
    async fn test_load_failure_returns_503() {
        let dir = tempfile::tempdir().unwrap();
        let (_host, router) = test_router(
            FakeModelConfig {
                fail_load: true,
                ..Default::default()
            },
            dir.path(),
        );

        let (status, json) = send(router, post_generate("")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["errno"], 503);
    }

    #[tokio::test]
    async fn test_generation_failure_returns_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let (_host, router) = test_router(
            FakeModelConfig {
                fail_generate: true,
                ..Default::default()
            },
            dir.path(),
        );

        let (status, json) = send(router, post_generate("")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["errno"], 500);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_ping_and_models_status() {
        let dir = tempfile::tempdir().unwrap();
        let (host, router) = test_router(FakeModelConfig::default(), dir.path());

        let ping = Request::builder().uri("/api/ping").body(Body::empty()).unwrap();
        let (status, json) = send(router.clone(), ping).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["models_loaded"], false);

        host.warm_up().await.unwrap();
        let status_req = Request::builder()
            .uri("/api/models/status")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(router, status_req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["loaded"], true);
        assert_eq!(json["music_model"], "fake-ace-step");
        assert_eq!(json["idle_teardown_secs"], 15);
    }

    #[tokio::test]
    async fn test_ping_reports_resident_models_and_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let (host, router) = test_router(FakeModelConfig::default(), dir.path());
        host.warm_up().await.unwrap();

        let ping = Request::builder().uri("/api/ping").body(Body::empty()).unwrap();
        let (status, json) = send(router.clone(), ping).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["models_loaded"], true);
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));

        host.shutdown().await;
        let ping = Request::builder().uri("/api/ping").body(Body::empty()).unwrap();
        let (status, json) = send(router, ping).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "shutting_down");
        assert_eq!(json["models_loaded"], false);
    }
}
