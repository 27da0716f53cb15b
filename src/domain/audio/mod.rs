//! Audio Context - 音频容器识别与 WAV/MP3 头部工具

mod container;
mod mp3_header;
mod wav;

pub use container::AudioContainer;
pub use mp3_header::{scan_mp3_frames, ChannelMode, Mp3FrameHeader, MpegLayer, MpegVersion};
pub use wav::{encode_pcm16_wav, is_wav};
