//! 音频容器格式

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 音频容器格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    Wav,
    Mp3,
}

impl AudioContainer {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }

    /// 根据路径扩展名判断（大小写不敏感）
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// 根据文件头魔数判断
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if super::is_wav(data) {
            return Some(Self::Wav);
        }
        if data.starts_with(b"ID3") || super::scan_mp3_frames(data).first().is_some() {
            return Some(Self::Mp3);
        }
        None
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
        }
    }
}

impl std::fmt::Display for AudioContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path_is_case_insensitive() {
        assert_eq!(
            AudioContainer::from_path(&PathBuf::from("generated.WAV")),
            Some(AudioContainer::Wav)
        );
        assert_eq!(
            AudioContainer::from_path(&PathBuf::from("song.mp3")),
            Some(AudioContainer::Mp3)
        );
        assert_eq!(AudioContainer::from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(AudioContainer::from_path(&PathBuf::from("wav")), None);
    }

    #[test]
    fn test_sniff() {
        let wav = super::super::encode_pcm16_wav(&[0.0; 8], 16000, 1);
        assert_eq!(AudioContainer::sniff(&wav), Some(AudioContainer::Wav));
        assert_eq!(AudioContainer::sniff(b"ID3\x04\x00"), Some(AudioContainer::Mp3));
        assert_eq!(AudioContainer::sniff(b"hello world"), None);
    }
}
