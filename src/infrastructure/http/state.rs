//! Application State

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::{GenerateMusicHandler, ModelHost};
use crate::domain::music::GenerationParams;

/// 应用状态
pub struct AppState {
    pub model_host: Arc<ModelHost>,
    pub generate_handler: GenerateMusicHandler,
}

impl AppState {
    pub fn new(
        model_host: Arc<ModelHost>,
        output_dir: impl Into<PathBuf>,
        defaults: GenerationParams,
    ) -> Self {
        Self {
            model_host: model_host.clone(),
            generate_handler: GenerateMusicHandler::new(model_host, output_dir, defaults),
        }
    }
}
