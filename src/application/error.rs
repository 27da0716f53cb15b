//! 应用层错误定义
//!
//! 统一的命令错误类型

use std::path::PathBuf;
use thiserror::Error;

use crate::application::ports::{ModelError, TranscodeError};
use crate::domain::music::MusicError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 外部服务（模型后端）不可用
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 生成失败
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建存储错误
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError(message.into())
    }
}

impl From<MusicError> for ApplicationError {
    fn from(err: MusicError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<ModelError> for ApplicationError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::LoadFailed { .. }
            | ModelError::Unavailable(_)
            | ModelError::Network(_)
            | ModelError::Timeout => Self::ExternalServiceError(err.to_string()),
            ModelError::Backend(_) | ModelError::InvalidResponse(_) => {
                Self::GenerationFailed(err.to_string())
            }
        }
    }
}

/// 格式转换错误
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("File '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("'{}' is not a WAV file", .0.display())]
    NotWav(PathBuf),

    #[error("Failed to decode '{}': {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to encode '{}': {reason}", .path.display())]
    Encode { path: PathBuf, reason: String },

    #[error("IO error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn from_transcode(path: impl Into<PathBuf>, err: TranscodeError) -> Self {
        let path = path.into();
        match err {
            TranscodeError::InvalidInput(reason) | TranscodeError::DecodingError(reason) => {
                Self::Decode { path, reason }
            }
            TranscodeError::EncodingError(reason) | TranscodeError::UnsupportedFormat(reason) => {
                Self::Encode { path, reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_mapping() {
        let err: ApplicationError = ModelError::Timeout.into();
        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));

        let err: ApplicationError = ModelError::Backend("cuda oom".into()).into();
        assert!(matches!(err, ApplicationError::GenerationFailed(_)));

        let err: ApplicationError = ModelError::load_failed("ace-step", "missing checkpoint").into();
        assert!(err.to_string().contains("ace-step"));
    }

    #[test]
    fn test_convert_error_messages_name_the_file() {
        let err = ConvertError::NotFound(PathBuf::from("generated.wav"));
        assert_eq!(err.to_string(), "File 'generated.wav' not found");

        let err = ConvertError::NotWav(PathBuf::from("song.mp3"));
        assert_eq!(err.to_string(), "'song.mp3' is not a WAV file");
    }
}
