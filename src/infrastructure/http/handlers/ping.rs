//! Ping Handler
//!
//! 存活检查：报告服务版本、模型是否常驻，以及是否正在关闭

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    /// "ok" 或 "shutting_down"
    pub status: &'static str,
    pub version: &'static str,
    pub models_loaded: bool,
}

/// 关闭开始后返回 503，便于负载均衡摘除实例
pub async fn ping(State(state): State<Arc<AppState>>) -> (StatusCode, Json<PingResponse>) {
    let host = &state.model_host;
    let (code, status) = if host.is_shut_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting_down")
    } else {
        (StatusCode::OK, "ok")
    };

    (
        code,
        Json(PingResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            models_loaded: host.is_resident(),
        }),
    )
}
