//! Music Context - Value Objects

use serde::{Deserialize, Serialize};

use super::MusicError;

/// 默认风格提示词
pub const DEFAULT_PROMPT: &str = "hip-hop, rap, new york, joyful, 120bpm ";

/// 纯音乐歌词占位符
pub const INSTRUMENTAL_LYRICS: &str = "[instrumental]";

/// 默认歌词（纯音乐）
pub const DEFAULT_LYRICS: &str = INSTRUMENTAL_LYRICS;

/// 默认音频时长（秒）
pub const DEFAULT_AUDIO_DURATION_SECS: f64 = 120.0;

/// 默认推理步数
pub const DEFAULT_INFER_STEP: u32 = 60;

/// 默认 guidance scale
pub const DEFAULT_GUIDANCE_SCALE: f64 = 15.0;

pub const MAX_AUDIO_DURATION_SECS: f64 = 240.0;
pub const MAX_INFER_STEP: u32 = 200;
pub const MAX_GUIDANCE_SCALE: f64 = 30.0;

/// 音乐生成参数
///
/// 默认值即服务历史上固定使用的参数，不带请求体的调用得到的就是这一组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// 风格提示词（流派、情绪、速度等）
    pub prompt: String,
    /// 歌词，`[instrumental]` 表示纯音乐
    pub lyrics: String,
    /// 音频时长（秒）
    pub audio_duration: f64,
    /// 扩散推理步数
    pub infer_step: u32,
    /// classifier-free guidance 强度
    pub guidance_scale: f64,
    /// 随机种子，None 表示由后端随机选择
    pub seed: Option<u64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            lyrics: DEFAULT_LYRICS.to_string(),
            audio_duration: DEFAULT_AUDIO_DURATION_SECS,
            infer_step: DEFAULT_INFER_STEP,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            seed: None,
        }
    }
}

impl GenerationParams {
    /// 校验参数范围
    pub fn validate(&self) -> Result<(), MusicError> {
        if self.prompt.trim().is_empty() {
            return Err(MusicError::EmptyPrompt);
        }
        if !self.audio_duration.is_finite()
            || self.audio_duration <= 0.0
            || self.audio_duration > MAX_AUDIO_DURATION_SECS
        {
            return Err(MusicError::InvalidDuration(self.audio_duration));
        }
        if self.infer_step == 0 || self.infer_step > MAX_INFER_STEP {
            return Err(MusicError::InvalidInferStep(self.infer_step));
        }
        if !self.guidance_scale.is_finite()
            || self.guidance_scale < 0.0
            || self.guidance_scale > MAX_GUIDANCE_SCALE
        {
            return Err(MusicError::InvalidGuidanceScale(self.guidance_scale));
        }
        Ok(())
    }

    /// 切换为纯音乐
    pub fn make_instrumental(&mut self) {
        self.lyrics = INSTRUMENTAL_LYRICS.to_string();
    }

    pub fn is_instrumental(&self) -> bool {
        self.lyrics.trim().eq_ignore_ascii_case(INSTRUMENTAL_LYRICS) || self.lyrics.trim().is_empty()
    }
}
