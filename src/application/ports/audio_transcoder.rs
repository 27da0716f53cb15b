//! Audio Transcoder Port - 音频转码抽象
//!
//! 定义音频转码的抽象接口，当前用于 WAV → MP3

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::AudioContainer;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 支持的 MP3 恒定比特率（kbps）
pub const SUPPORTED_MP3_BITRATES: [u32; 13] =
    [32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];

/// 转码配置
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// 输出格式
    pub format: AudioContainer,
    /// 目标比特率（kbps），用于有损压缩格式
    pub bitrate_kbps: u32,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            format: AudioContainer::Mp3,
            bitrate_kbps: 192,
        }
    }
}

/// 转码结果
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    /// 转码后的音频数据
    pub audio_data: Vec<u8>,
    /// 输出格式
    pub format: AudioContainer,
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 输出声道数
    pub channels: u8,
    /// 原始大小（字节）
    pub input_size: usize,
    /// 转码后大小（字节）
    pub transcoded_size: usize,
}

/// 音频信息
#[derive(Debug, Clone)]
pub struct AudioInfo {
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u8,
}

/// Audio Transcoder Port
#[async_trait]
pub trait AudioTranscoderPort: Send + Sync {
    /// 转码音频
    ///
    /// # Arguments
    /// * `wav_data` - 输入的 WAV 音频数据
    /// * `config` - 转码配置
    async fn transcode(
        &self,
        wav_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError>;

    /// 获取音频信息（不转码）
    fn get_audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError>;

    /// 检查是否支持指定格式
    fn supports_format(&self, format: AudioContainer) -> bool;
}
