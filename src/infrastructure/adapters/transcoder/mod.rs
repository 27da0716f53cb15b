//! Transcoder Adapter - WAV → MP3

mod mp3_transcoder;

pub use mp3_transcoder::Mp3Transcoder;
