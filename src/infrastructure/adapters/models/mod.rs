//! Model Adapters - 推理后端的具体实现

mod backend;
mod fake_models;
mod http_image_pipeline;
mod http_language_model;
mod http_model_loader;
mod http_music_pipeline;

pub use backend::{BackendClient, BackendConfig};
pub use fake_models::{FakeModelConfig, FakeModelLoader, GeneratedRecord};
pub use http_image_pipeline::HttpImagePipeline;
pub use http_language_model::HttpLanguageModel;
pub use http_model_loader::{HttpModelLoader, HttpModelsConfig, MUSIC_MODEL_ID};
pub use http_music_pipeline::HttpMusicPipeline;
