//! Convert Commands - 音频格式转换命令

use std::path::PathBuf;

/// WAV → MP3 转换命令
#[derive(Debug, Clone)]
pub struct ConvertAudioCommand {
    pub input: PathBuf,
}

/// 转换结果
#[derive(Debug, Clone)]
pub struct ConvertAudioResponse {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 输出文件首帧的实际比特率
    pub bitrate_kbps: u32,
    pub duration_ms: u64,
    pub output_size: usize,
}
