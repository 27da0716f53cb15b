//! Convert Command Handlers

use std::sync::Arc;

use crate::application::commands::{ConvertAudioCommand, ConvertAudioResponse};
use crate::application::error::ConvertError;
use crate::application::ports::{AudioTranscoderPort, TranscodeConfig, TranscodeError};
use crate::domain::audio::{scan_mp3_frames, AudioContainer};

/// ConvertAudio Handler - WAV 转 MP3，输出写在输入文件旁边
pub struct ConvertAudioHandler {
    transcoder: Arc<dyn AudioTranscoderPort>,
    bitrate_kbps: u32,
}

impl ConvertAudioHandler {
    pub fn new(transcoder: Arc<dyn AudioTranscoderPort>, bitrate_kbps: u32) -> Self {
        Self {
            transcoder,
            bitrate_kbps,
        }
    }

    pub async fn handle(&self, cmd: ConvertAudioCommand) -> Result<ConvertAudioResponse, ConvertError> {
        let input = cmd.input;

        let is_file = match tokio::fs::metadata(&input).await {
            Ok(metadata) => metadata.is_file(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(ConvertError::io(&input, e)),
        };
        if !is_file {
            return Err(ConvertError::NotFound(input));
        }

        if AudioContainer::from_path(&input) != Some(AudioContainer::Wav) {
            return Err(ConvertError::NotWav(input));
        }

        let wav_data = tokio::fs::read(&input)
            .await
            .map_err(|e| ConvertError::io(&input, e))?;
        // 扩展名是唯一的 NotWav 判定；内容不符按解码失败处理
        if AudioContainer::sniff(&wav_data) != Some(AudioContainer::Wav) {
            return Err(ConvertError::Decode {
                path: input,
                reason: "missing RIFF/WAVE header".to_string(),
            });
        }
        if !self.transcoder.supports_format(AudioContainer::Mp3) {
            return Err(ConvertError::from_transcode(
                &input,
                TranscodeError::UnsupportedFormat(AudioContainer::Mp3.to_string()),
            ));
        }

        let info = self
            .transcoder
            .get_audio_info(&wav_data)
            .map_err(|e| ConvertError::from_transcode(&input, e))?;
        tracing::debug!(
            input = %input.display(),
            sample_rate = info.sample_rate,
            channels = info.channels,
            duration_ms = info.duration_ms,
            "Converting WAV"
        );

        let config = TranscodeConfig {
            format: AudioContainer::Mp3,
            bitrate_kbps: self.bitrate_kbps,
        };
        let result = self
            .transcoder
            .transcode(&wav_data, &config)
            .await
            .map_err(|e| {
                tracing::error!(input = %input.display(), error = %e, "Transcode failed");
                ConvertError::from_transcode(&input, e)
            })?;

        let output = input.with_extension(AudioContainer::Mp3.extension());
        tokio::fs::write(&output, &result.audio_data)
            .await
            .map_err(|e| ConvertError::io(&output, e))?;

        let bitrate_kbps = scan_mp3_frames(&result.audio_data)
            .first()
            .map(|frame| frame.bitrate_kbps)
            .unwrap_or(self.bitrate_kbps);

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            bitrate_kbps,
            duration_ms = result.duration_ms,
            input_size = result.input_size,
            transcoded_size = result.transcoded_size,
            "Converted WAV to MP3"
        );

        Ok(ConvertAudioResponse {
            input,
            output,
            bitrate_kbps,
            duration_ms: result.duration_ms,
            output_size: result.transcoded_size,
        })
    }
}
