//! Model Status Handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::ModelHostStatus;
use crate::infrastructure::http::state::AppState;

/// 模型常驻状态
pub async fn models_status(State(state): State<Arc<AppState>>) -> Json<ModelHostStatus> {
    Json(state.model_host.status().await)
}
