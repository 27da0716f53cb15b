//! MP3 Transcoder - symphonia 解码 + LAME 编码
//!
//! 支持：
//! - WAV 解析和信息提取
//! - WAV → MP3（恒定比特率）

use async_trait::async_trait;
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, Quality};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{
    AudioInfo, AudioTranscoderPort, TranscodeConfig, TranscodeError, TranscodeResult,
};
use crate::domain::audio::AudioContainer;

/// MP3 转码器
#[derive(Debug, Default, Clone)]
pub struct Mp3Transcoder;

impl Mp3Transcoder {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct DecodedAudio {
    /// 交错 f32 样本
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u8,
    duration_ms: u64,
}

fn open_wav(data: &[u8]) -> Result<symphonia::core::probe::ProbeResult, TranscodeError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscodeError::DecodingError(format!("Format detection failed: {}", e)))
}

/// 使用 symphonia 解码 WAV 获取 PCM 数据
fn decode_wav_to_pcm(data: &[u8]) -> Result<DecodedAudio, TranscodeError> {
    let mut format = open_wav(data)?.format;

    let track = format
        .default_track()
        .ok_or_else(|| TranscodeError::DecodingError("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| TranscodeError::DecodingError("Unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u8)
        .ok_or_else(|| TranscodeError::DecodingError("Unknown channel count".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| TranscodeError::DecodingError(format!("Decoder creation failed: {}", e)))?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(TranscodeError::DecodingError(format!(
                    "Packet read error: {}",
                    e
                )));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Decode error (skipping packet): {}", e);
                continue;
            }
        };

        let signal_spec = *decoded.spec();
        let num_frames = decoded.frames();
        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, signal_spec);
        sample_buf.copy_interleaved_ref(decoded);
        let actual_samples = num_frames * signal_spec.channels.count();
        samples.extend(&sample_buf.samples()[..actual_samples]);
    }

    if samples.is_empty() {
        return Err(TranscodeError::DecodingError(
            "No audio samples decoded".to_string(),
        ));
    }

    let duration_ms = (samples.len() as u64 * 1000) / (sample_rate as u64 * channels as u64);

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels,
        duration_ms,
    })
}

/// 统一为双声道交错样本：单声道复制，多声道取前两路
fn to_stereo(pcm: &DecodedAudio) -> Vec<f32> {
    match pcm.channels {
        0 => Vec::new(),
        2 => pcm.samples.clone(),
        1 => pcm.samples.iter().flat_map(|&s| [s, s]).collect(),
        n => pcm
            .samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

fn lame_bitrate(kbps: u32) -> Result<Bitrate, TranscodeError> {
    let bitrate = match kbps {
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(TranscodeError::UnsupportedFormat(format!(
                "MP3 bitrate {} kbps",
                other
            )))
        }
    };
    Ok(bitrate)
}

/// 将 PCM 样本编码为恒定比特率 MP3
fn encode_mp3(pcm: &DecodedAudio, bitrate_kbps: u32) -> Result<Vec<u8>, TranscodeError> {
    let samples = to_stereo(pcm);

    let mut encoder = Builder::new()
        .ok_or_else(|| TranscodeError::EncodingError("Failed to create LAME encoder".into()))?
        .with_num_channels(2)
        .map_err(|e| TranscodeError::EncodingError(format!("LAME set_num_channels failed: {e:?}")))?
        .with_sample_rate(pcm.sample_rate)
        .map_err(|e| TranscodeError::EncodingError(format!("LAME set_sample_rate failed: {e:?}")))?
        .with_brate(lame_bitrate(bitrate_kbps)?)
        .map_err(|e| TranscodeError::EncodingError(format!("LAME set_brate failed: {e:?}")))?
        .with_quality(Quality::Best)
        .map_err(|e| TranscodeError::EncodingError(format!("LAME set_quality failed: {e:?}")))?
        .build()
        .map_err(|e| TranscodeError::EncodingError(format!("LAME build failed: {e:?}")))?;

    let frames = samples.len() / 2;
    let mut buf = Vec::new();
    buf.reserve(mp3lame_encoder::max_required_buffer_size(frames));

    let encoded_size = encoder
        .encode(InterleavedPcm(&samples), buf.spare_capacity_mut())
        .map_err(|e| TranscodeError::EncodingError(format!("LAME encode failed: {e:?}")))?;
    // SAFETY: encode 恰好写入了 spare capacity 的前 `encoded_size` 字节
    unsafe { buf.set_len(encoded_size) };

    buf.reserve(7200);
    let flush_size = encoder
        .flush::<FlushNoGap>(buf.spare_capacity_mut())
        .map_err(|e| TranscodeError::EncodingError(format!("LAME flush failed: {e:?}")))?;
    // SAFETY: flush 恰好追加了 `flush_size` 字节
    unsafe { buf.set_len(buf.len() + flush_size) };

    Ok(buf)
}

/// 仅支持输出 MP3
fn supports_output(format: AudioContainer) -> bool {
    matches!(format, AudioContainer::Mp3)
}

fn transcode_blocking(
    wav_data: &[u8],
    config: &TranscodeConfig,
) -> Result<TranscodeResult, TranscodeError> {
    let input_size = wav_data.len();
    if !supports_output(config.format) {
        return Err(TranscodeError::UnsupportedFormat(format!(
            "output container {}",
            config.format
        )));
    }
    let decoded = decode_wav_to_pcm(wav_data)?;
    let mp3_data = encode_mp3(&decoded, config.bitrate_kbps)?;

    tracing::debug!(
        input_size,
        mp3_size = mp3_data.len(),
        bitrate_kbps = config.bitrate_kbps,
        "Encoded to MP3"
    );

    Ok(TranscodeResult {
        transcoded_size: mp3_data.len(),
        audio_data: mp3_data,
        format: AudioContainer::Mp3,
        duration_ms: decoded.duration_ms,
        sample_rate: decoded.sample_rate,
        channels: 2,
        input_size,
    })
}

#[async_trait]
impl AudioTranscoderPort for Mp3Transcoder {
    async fn transcode(
        &self,
        wav_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError> {
        let data = wav_data.to_vec();
        let config = config.clone();
        tokio::task::spawn_blocking(move || transcode_blocking(&data, &config))
            .await
            .map_err(|e| TranscodeError::EncodingError(format!("Transcode task panicked: {}", e)))?
    }

    fn get_audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError> {
        let opened = open_wav(wav_data)?;
        let track = opened
            .format
            .default_track()
            .ok_or_else(|| TranscodeError::InvalidInput("No audio track found".to_string()))?;
        let params = &track.codec_params;

        let sample_rate = params
            .sample_rate
            .ok_or_else(|| TranscodeError::InvalidInput("Unknown sample rate".to_string()))?;
        let channels = params.channels.map(|c| c.count() as u8).unwrap_or(0);
        let duration_ms = params
            .n_frames
            .map(|frames| frames * 1000 / sample_rate as u64)
            .unwrap_or(0);

        Ok(AudioInfo {
            duration_ms,
            sample_rate,
            channels,
        })
    }

    fn supports_format(&self, format: AudioContainer) -> bool {
        supports_output(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::{encode_pcm16_wav, scan_mp3_frames};

    fn create_test_wav(sample_rate: u32, channels: u16, seconds: f32) -> Vec<u8> {
        let frames = (sample_rate as f32 * seconds) as usize;
        let samples = vec![0.0f32; frames * channels as usize];
        encode_pcm16_wav(&samples, sample_rate, channels)
    }

    #[test]
    fn test_get_audio_info() {
        let transcoder = Mp3Transcoder::new();
        let wav = create_test_wav(16000, 1, 1.0);

        let info = transcoder.get_audio_info(&wav).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert!(info.duration_ms >= 990 && info.duration_ms <= 1010);
    }

    #[tokio::test]
    async fn test_wav_output_is_rejected() {
        let transcoder = Mp3Transcoder::new();
        let wav = create_test_wav(16000, 1, 0.1);

        let config = TranscodeConfig {
            format: AudioContainer::Wav,
            ..Default::default()
        };

        let err = transcoder.transcode(&wav, &config).await.unwrap_err();
        assert!(matches!(err, TranscodeError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_mono_input_is_upmixed() {
        let transcoder = Mp3Transcoder::new();
        let wav = create_test_wav(48000, 1, 0.5);

        let result = transcoder
            .transcode(&wav, &TranscodeConfig::default())
            .await
            .unwrap();
        assert_eq!(result.format, AudioContainer::Mp3);
        assert_eq!(result.channels, 2);
        assert!(result.transcoded_size < result.input_size);

        let frames = scan_mp3_frames(&result.audio_data);
        assert!(!frames.is_empty());
        assert_eq!(frames[0].sample_rate, 48000);
        assert_eq!(frames[0].bitrate_kbps, 192);
    }

    #[tokio::test]
    async fn test_unsupported_bitrate() {
        let transcoder = Mp3Transcoder::new();
        let wav = create_test_wav(44100, 2, 0.1);
        let config = TranscodeConfig {
            format: AudioContainer::Mp3,
            bitrate_kbps: 100,
        };
        let err = transcoder.transcode(&wav, &config).await.unwrap_err();
        assert!(matches!(err, TranscodeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_to_stereo_drops_extra_channels() {
        let pcm = DecodedAudio {
            samples: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            sample_rate: 8000,
            channels: 3,
            duration_ms: 0,
        };
        assert_eq!(to_stereo(&pcm), vec![0.1, 0.2, 0.4, 0.5]);
    }

    #[test]
    fn test_supports_format() {
        let transcoder = Mp3Transcoder::new();
        assert!(transcoder.supports_format(AudioContainer::Mp3));
        assert!(!transcoder.supports_format(AudioContainer::Wav));
    }
}
