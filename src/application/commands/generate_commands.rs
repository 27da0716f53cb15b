//! Generation Commands - 音乐生成命令

use serde::Deserialize;

/// 生成音乐命令
///
/// 所有字段均可省略，省略的字段使用配置中的默认生成参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateMusicCommand {
    pub prompt: Option<String>,
    pub lyrics: Option<String>,
    pub audio_duration: Option<f64>,
    pub infer_step: Option<u32>,
    pub guidance_scale: Option<f64>,
    pub seed: Option<u64>,
    /// 为 true 时强制纯音乐，忽略歌词
    pub instrumental: Option<bool>,
    /// 整首歌的描述：由语言模型写出风格标签、歌词（非纯音乐时）与分类
    ///
    /// 提供时覆盖 `prompt` 与 `described_lyrics`
    pub full_described_song: Option<String>,
    /// 歌词描述，由语言模型扩写为歌词
    pub described_lyrics: Option<String>,
    /// 封面提示词，提供时额外生成一张封面
    pub cover_prompt: Option<String>,
}

/// 生成音乐响应
#[derive(Debug, Clone)]
pub struct GenerateMusicResponse {
    /// Base64 编码的 WAV 数据
    pub audio_data: String,
    /// Base64 编码的 PNG 封面
    pub cover_image_data: Option<String>,
    /// 由整首歌描述归纳的分类，其他模式为空
    pub categories: Vec<String>,
    /// 原始 WAV 字节数
    pub audio_size: usize,
}
