//! HTTP Routes
//!
//! API Endpoints:
//! - /generate            POST  生成一段音乐（可选 JSON 参数）
//! - /api/ping            GET   健康检查
//! - /api/models/status   GET   模型常驻状态

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(handlers::generate))
        .nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/models/status", get(handlers::models_status))
}
