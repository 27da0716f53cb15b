//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_transcoder;
mod image_pipeline;
mod language_model;
mod model_loader;
mod music_pipeline;

pub use audio_transcoder::{
    AudioInfo, AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscodeResult,
    SUPPORTED_MP3_BITRATES,
};
pub use image_pipeline::ImagePipelinePort;
pub use language_model::{ChatMessage, LanguageModelPort};
pub use model_loader::{LoadedModels, ModelError, ModelLoaderPort};
pub use music_pipeline::MusicPipelinePort;
