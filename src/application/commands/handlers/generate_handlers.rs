//! Generation Command Handlers

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{GenerateMusicCommand, GenerateMusicResponse};
use crate::application::error::ApplicationError;
use crate::application::model_host::ModelHost;
use crate::application::ports::{ChatMessage, LanguageModelPort};
use crate::domain::audio::is_wav;
use crate::domain::music::GenerationParams;

/// 歌词扩写的系统提示词
pub const LYRICS_SYSTEM_PROMPT: &str = "You are a songwriter. Write song lyrics for the \
description the user gives you. Structure them with section tags such as [verse], [chorus] \
and [bridge], one tag per line before each section. Reply with the lyrics only.";

/// 由整首歌描述生成 ACE-Step 风格标签的系统提示词
pub const STYLE_SYSTEM_PROMPT: &str = "You describe music for a text-to-audio model. Turn the \
song description the user gives you into a single line of comma-separated style tags: genre, \
mood, instruments and tempo in bpm. Reply with the tags only.";

/// 由整首歌描述归纳曲风分类的系统提示词
pub const CATEGORIES_SYSTEM_PROMPT: &str = "Classify the song description the user gives you \
into at most three short music genre or mood categories. Reply with the categories only, \
separated by commas.";

const LYRICS_MAX_NEW_TOKENS: u32 = 1024;
const STYLE_MAX_NEW_TOKENS: u32 = 128;
const CATEGORIES_MAX_NEW_TOKENS: u32 = 64;

/// 每首歌最多返回的分类数
pub const MAX_CATEGORIES: usize = 3;

/// 临时输出文件，离开作用域时删除
struct TempOutput {
    path: PathBuf,
}

impl TempOutput {
    fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.wav", Uuid::new_v4())),
        }
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Temporary output removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove temporary output"
            ),
        }
    }
}

/// GenerateMusic Handler - 生成一段音乐并以 Base64 返回
pub struct GenerateMusicHandler {
    model_host: Arc<ModelHost>,
    output_dir: PathBuf,
    defaults: GenerationParams,
}

impl GenerateMusicHandler {
    pub fn new(
        model_host: Arc<ModelHost>,
        output_dir: impl Into<PathBuf>,
        defaults: GenerationParams,
    ) -> Self {
        Self {
            model_host,
            output_dir: output_dir.into(),
            defaults,
        }
    }

    /// 默认参数叠加请求字段后校验
    pub fn resolve_params(
        &self,
        cmd: &GenerateMusicCommand,
    ) -> Result<GenerationParams, ApplicationError> {
        let mut params = self.defaults.clone();
        if let Some(prompt) = &cmd.prompt {
            params.prompt = prompt.clone();
        }
        if let Some(lyrics) = &cmd.lyrics {
            params.lyrics = lyrics.clone();
        }
        if let Some(duration) = cmd.audio_duration {
            params.audio_duration = duration;
        }
        if let Some(steps) = cmd.infer_step {
            params.infer_step = steps;
        }
        if let Some(scale) = cmd.guidance_scale {
            params.guidance_scale = scale;
        }
        if cmd.seed.is_some() {
            params.seed = cmd.seed;
        }
        if cmd.instrumental == Some(true) {
            params.make_instrumental();
        }

        params.validate()?;
        Ok(params)
    }

    pub async fn handle(
        &self,
        cmd: GenerateMusicCommand,
    ) -> Result<GenerateMusicResponse, ApplicationError> {
        let mut params = self.resolve_params(&cmd)?;

        let models = self.model_host.acquire().await?;
        let language = models.language.as_ref();
        let instrumental = cmd.instrumental == Some(true);
        let mut categories = Vec::new();

        // 整首歌描述优先：风格、歌词与分类都交给语言模型
        if let Some(song) = non_blank(cmd.full_described_song.as_deref()) {
            params.prompt = write_style_prompt(language, song).await?;
            if !instrumental {
                params.lyrics = write_lyrics(language, song).await?;
            }
            categories = write_categories(language, song).await?;
            params.validate()?;
        } else if let Some(description) = non_blank(cmd.described_lyrics.as_deref()) {
            if !instrumental {
                params.lyrics = write_lyrics(language, description).await?;
            }
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ApplicationError::storage(format!("Failed to create output dir: {}", e)))?;

        let output = TempOutput::new(&self.output_dir);

        tracing::info!(
            prompt = %params.prompt,
            duration_s = params.audio_duration,
            infer_step = params.infer_step,
            guidance_scale = params.guidance_scale,
            seed = ?params.seed,
            instrumental = params.is_instrumental(),
            path = %output.path.display(),
            "Generating music"
        );

        models.music.generate(&params, &output.path).await?;

        let audio_bytes = tokio::fs::read(&output.path).await.map_err(|e| {
            ApplicationError::storage(format!(
                "Failed to read generated audio {}: {}",
                output.path.display(),
                e
            ))
        })?;
        drop(output);

        if audio_bytes.is_empty() {
            return Err(ApplicationError::GenerationFailed(
                "music pipeline produced an empty file".to_string(),
            ));
        }
        if !is_wav(&audio_bytes) {
            tracing::warn!(size = audio_bytes.len(), "Generated audio has no RIFF/WAVE header");
        }

        let cover_image_data = match cmd.cover_prompt.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => {
                let png = models.image.render(prompt).await?;
                Some(BASE64.encode(png))
            }
            _ => None,
        };

        tracing::info!(
            audio_size = audio_bytes.len(),
            with_cover = cover_image_data.is_some(),
            categories = ?categories,
            "Music generated"
        );

        Ok(GenerateMusicResponse {
            audio_data: BASE64.encode(&audio_bytes),
            cover_image_data,
            categories,
            audio_size: audio_bytes.len(),
        })
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

async fn ask(
    language: &dyn LanguageModelPort,
    system_prompt: &str,
    description: &str,
    max_new_tokens: u32,
) -> Result<String, ApplicationError> {
    let messages = [
        ChatMessage::system(system_prompt),
        ChatMessage::user(description),
    ];
    Ok(language.complete(&messages, max_new_tokens).await?)
}

/// 用语言模型把歌词描述扩写为带段落标签的歌词
async fn write_lyrics(
    language: &dyn LanguageModelPort,
    description: &str,
) -> Result<String, ApplicationError> {
    let lyrics = ask(language, LYRICS_SYSTEM_PROMPT, description, LYRICS_MAX_NEW_TOKENS).await?;
    let lyrics = lyrics.trim();
    if lyrics.is_empty() {
        return Err(ApplicationError::GenerationFailed(
            "language model returned empty lyrics".to_string(),
        ));
    }
    tracing::debug!(chars = lyrics.len(), "Lyrics written from description");
    Ok(lyrics.to_string())
}

/// 风格标签只取第一行非空文本
async fn write_style_prompt(
    language: &dyn LanguageModelPort,
    description: &str,
) -> Result<String, ApplicationError> {
    let reply = ask(language, STYLE_SYSTEM_PROMPT, description, STYLE_MAX_NEW_TOKENS).await?;
    let prompt = reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| {
            ApplicationError::GenerationFailed("language model returned an empty prompt".to_string())
        })?;
    tracing::debug!(prompt = %prompt, "Style prompt written from description");
    Ok(prompt.to_string())
}

async fn write_categories(
    language: &dyn LanguageModelPort,
    description: &str,
) -> Result<Vec<String>, ApplicationError> {
    let reply = ask(
        language,
        CATEGORIES_SYSTEM_PROMPT,
        description,
        CATEGORIES_MAX_NEW_TOKENS,
    )
    .await?;
    Ok(parse_categories(&reply))
}

/// 拆分逗号或换行分隔的分类，去掉列表符号与引号，按大小写去重
pub fn parse_categories(reply: &str) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for item in reply.split([',', '\n']) {
        let item = strip_list_marker(item.trim())
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '.'));
        if item.is_empty() || categories.iter().any(|c| c.eq_ignore_ascii_case(item)) {
            continue;
        }
        categories.push(item.to_string());
        if categories.len() == MAX_CATEGORIES {
            break;
        }
    }
    categories
}

/// 去掉 `-`、`*`、`•` 或 `1.`、`2)` 形式的列表前缀
fn strip_list_marker(item: &str) -> &str {
    let item = item.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = item.len() - item.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = item[digits..].strip_prefix(['.', ')']) {
            return rest;
        }
    }
    item
}
