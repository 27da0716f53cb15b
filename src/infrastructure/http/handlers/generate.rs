//! Generate Handler

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

use crate::application::GenerateMusicCommand;
use crate::infrastructure::http::dto::GenerateMusicResponseDto;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 请求体可为空；为空时使用默认生成参数
fn parse_command(body: &[u8]) -> Result<GenerateMusicCommand, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateMusicCommand::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerateMusicResponseDto>, ApiError> {
    let cmd = parse_command(&body)?;
    let result = state.generate_handler.handle(cmd).await?;
    Ok(Json(result.into()))
}
