//! Music Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MusicError {
    #[error("提示词不能为空")]
    EmptyPrompt,

    #[error("无效的音频时长: {0}s (允许范围 (0, 240])")]
    InvalidDuration(f64),

    #[error("无效的推理步数: {0} (允许范围 1..=200)")]
    InvalidInferStep(u32),

    #[error("无效的 guidance scale: {0} (允许范围 [0, 30])")]
    InvalidGuidanceScale(f64),
}
