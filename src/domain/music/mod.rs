//! Music Context - 音乐生成领域
//!
//! 生成参数值对象及其校验规则

mod errors;
mod value_objects;

pub use errors::MusicError;
pub use value_objects::{
    GenerationParams, DEFAULT_GUIDANCE_SCALE, DEFAULT_INFER_STEP, DEFAULT_LYRICS, DEFAULT_PROMPT,
    DEFAULT_AUDIO_DURATION_SECS, INSTRUMENTAL_LYRICS, MAX_AUDIO_DURATION_SECS, MAX_GUIDANCE_SCALE,
    MAX_INFER_STEP,
};
