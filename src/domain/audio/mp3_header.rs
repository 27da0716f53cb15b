//! MPEG 音频帧头解析
//!
//! 用于校验编码结果（比特率、采样率、声道模式），不做解码

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegLayer {
    Layer1,
    Layer2,
    Layer3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

/// 单个 MPEG 音频帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mp3FrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
    pub padding: bool,
    pub channel_mode: ChannelMode,
}

const BITRATES_V1_L1: [u32; 15] = [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448];
const BITRATES_V1_L2: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384];
const BITRATES_V1_L3: [u32; 15] = [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320];
const BITRATES_V2_L1: [u32; 15] = [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256];
const BITRATES_V2_L23: [u32; 15] = [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160];

impl Mp3FrameHeader {
    /// 解析 4 字节帧头，无效（含 free-format）返回 None
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (bytes[1] >> 3) & 0b11 {
            0b00 => MpegVersion::V25,
            0b10 => MpegVersion::V2,
            0b11 => MpegVersion::V1,
            _ => return None,
        };
        let layer = match (bytes[1] >> 1) & 0b11 {
            0b01 => MpegLayer::Layer3,
            0b10 => MpegLayer::Layer2,
            0b11 => MpegLayer::Layer1,
            _ => return None,
        };

        let bitrate_index = (bytes[2] >> 4) as usize;
        if bitrate_index == 0 || bitrate_index == 0xF {
            return None;
        }
        let table = match (version, layer) {
            (MpegVersion::V1, MpegLayer::Layer1) => &BITRATES_V1_L1,
            (MpegVersion::V1, MpegLayer::Layer2) => &BITRATES_V1_L2,
            (MpegVersion::V1, MpegLayer::Layer3) => &BITRATES_V1_L3,
            (_, MpegLayer::Layer1) => &BITRATES_V2_L1,
            _ => &BITRATES_V2_L23,
        };
        let bitrate_kbps = table[bitrate_index];

        let base_rate = match (bytes[2] >> 2) & 0b11 {
            0 => 44100,
            1 => 48000,
            2 => 32000,
            _ => return None,
        };
        let sample_rate = match version {
            MpegVersion::V1 => base_rate,
            MpegVersion::V2 => base_rate / 2,
            MpegVersion::V25 => base_rate / 4,
        };

        let channel_mode = match bytes[3] >> 6 {
            0 => ChannelMode::Stereo,
            1 => ChannelMode::JointStereo,
            2 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        Some(Self {
            version,
            layer,
            bitrate_kbps,
            sample_rate,
            padding: (bytes[2] >> 1) & 1 == 1,
            channel_mode,
        })
    }

    /// 帧长度（字节，含帧头）
    pub fn frame_len(&self) -> usize {
        let bitrate = self.bitrate_kbps as usize * 1000;
        let sample_rate = self.sample_rate as usize;
        let padding = self.padding as usize;
        match (self.layer, self.version) {
            (MpegLayer::Layer1, _) => (12 * bitrate / sample_rate + padding) * 4,
            (MpegLayer::Layer3, MpegVersion::V2 | MpegVersion::V25) => {
                72 * bitrate / sample_rate + padding
            }
            _ => 144 * bitrate / sample_rate + padding,
        }
    }

    pub fn channels(&self) -> u8 {
        match self.channel_mode {
            ChannelMode::Mono => 1,
            _ => 2,
        }
    }
}

/// ID3v2 标签长度（不存在时为 0）
fn id3v2_len(data: &[u8]) -> usize {
    if data.len() < 10 || &data[0..3] != b"ID3" {
        return 0;
    }
    let size = data[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | (b & 0x7F) as usize);
    let footer = if data[5] & 0x10 != 0 { 10 } else { 0 };
    10 + size + footer
}

/// 跳过 ID3v2 标签后，从第一个有效帧开始逐帧遍历
///
/// 遇到无法解析的数据即停止（例如尾部 ID3v1 标签）
pub fn scan_mp3_frames(data: &[u8]) -> Vec<Mp3FrameHeader> {
    let mut pos = id3v2_len(data);
    let mut frames = Vec::new();

    // 寻找第一个同步字
    while pos + 4 <= data.len() && Mp3FrameHeader::parse(&data[pos..]).is_none() {
        pos += 1;
    }

    while pos + 4 <= data.len() {
        let Some(header) = Mp3FrameHeader::parse(&data[pos..]) else {
            break;
        };
        let len = header.frame_len();
        if len < 4 {
            break;
        }
        frames.push(header);
        pos += len;
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    // MPEG-1 Layer III, 192 kbps, 44.1 kHz, no padding, joint stereo
    const HEADER_192K: [u8; 4] = [0xFF, 0xFB, 0xB0, 0x44];

    #[test]
    fn test_parse_192k_header() {
        let header = Mp3FrameHeader::parse(&HEADER_192K).unwrap();
        assert_eq!(header.version, MpegVersion::V1);
        assert_eq!(header.layer, MpegLayer::Layer3);
        assert_eq!(header.bitrate_kbps, 192);
        assert_eq!(header.sample_rate, 44100);
        assert_eq!(header.channel_mode, ChannelMode::JointStereo);
        assert_eq!(header.channels(), 2);
        assert_eq!(header.frame_len(), 626);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Mp3FrameHeader::parse(b"RIFF").is_none());
        assert!(Mp3FrameHeader::parse(&[0xFF, 0xFB]).is_none());
        // bitrate index 0xF
        assert!(Mp3FrameHeader::parse(&[0xFF, 0xFB, 0xF0, 0x44]).is_none());
    }

    #[test]
    fn test_scan_skips_id3_tag() {
        let header = Mp3FrameHeader::parse(&HEADER_192K).unwrap();
        let frame_len = header.frame_len();

        let mut data = Vec::new();
        data.extend_from_slice(b"ID3\x04\x00\x00\x00\x00\x00\x05");
        data.extend_from_slice(&[0u8; 5]);
        for _ in 0..3 {
            let mut frame = vec![0u8; frame_len];
            frame[..4].copy_from_slice(&HEADER_192K);
            data.extend_from_slice(&frame);
        }

        let frames = scan_mp3_frames(&data);
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.bitrate_kbps == 192));
    }
}
