//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（模型加载、三个推理管线、音频转码）
//! - commands: 生成与转码命令及处理器
//! - model_host: 模型常驻、串行与空闲回收
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod model_host;
pub mod ports;

pub use commands::{
    handlers::{ConvertAudioHandler, GenerateMusicHandler},
    ConvertAudioCommand, ConvertAudioResponse, GenerateMusicCommand, GenerateMusicResponse,
};

pub use error::{ApplicationError, ConvertError};

pub use model_host::{ModelHost, ModelHostConfig, ModelHostStatus, ModelLease};

pub use ports::{
    // Model loading
    LoadedModels,
    ModelError,
    ModelLoaderPort,
    // Pipelines
    ChatMessage,
    ImagePipelinePort,
    LanguageModelPort,
    MusicPipelinePort,
    // Transcoder
    AudioTranscoderPort,
    TranscodeConfig,
    TranscodeError,
    TranscodeResult,
};
