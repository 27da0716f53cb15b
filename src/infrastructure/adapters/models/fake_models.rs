//! Fake Models - 无 GPU 环境下的本地模型实现
//!
//! 音乐管线输出确定性的正弦波 WAV，语言模型按系统提示词返回风格标签、
//! 固定分类或带段落标签的歌词，文生图返回 1x1 的 PNG。用于 `models.backend = "fake"` 与测试。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::commands::handlers::{CATEGORIES_SYSTEM_PROMPT, STYLE_SYSTEM_PROMPT};
use crate::application::ports::{
    ChatMessage, ImagePipelinePort, LanguageModelPort, LoadedModels, ModelError, ModelLoaderPort,
    MusicPipelinePort,
};
use crate::domain::audio::encode_pcm16_wav;
use crate::domain::music::GenerationParams;

pub const FAKE_MUSIC_MODEL_ID: &str = "fake-ace-step";
pub const FAKE_LANGUAGE_MODEL_ID: &str = "fake-qwen2";
pub const FAKE_IMAGE_MODEL_ID: &str = "fake-sdxl-turbo";

/// 1x1 灰度 PNG
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x3A,
    0x7E, 0x9B, 0x55, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60,
    0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x48, 0xAF, 0xA4, 0x71, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Fake 模型配置
#[derive(Debug, Clone)]
pub struct FakeModelConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// 实际渲染的最长秒数，避免测试中生成 120 秒音频
    pub max_render_secs: f64,
    pub fail_load: bool,
    pub fail_generate: bool,
}

impl Default for FakeModelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_render_secs: 1.0,
            fail_load: false,
            fail_generate: false,
        }
    }
}

/// 一次生成的记录
#[derive(Debug, Clone)]
pub struct GeneratedRecord {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub params: GenerationParams,
}

#[derive(Default)]
struct FakeState {
    loads: AtomicU64,
    releases: AtomicU64,
    last_generated: Mutex<Option<GeneratedRecord>>,
}

/// Fake Model Loader
pub struct FakeModelLoader {
    config: FakeModelConfig,
    state: Arc<FakeState>,
}

impl FakeModelLoader {
    pub fn new(config: FakeModelConfig) -> Self {
        Self {
            config,
            state: Arc::new(FakeState::default()),
        }
    }

    /// 成功加载的次数
    pub fn load_count(&self) -> u64 {
        self.state.loads.load(Ordering::SeqCst)
    }

    /// 释放次数（以音乐管线计）
    pub fn release_count(&self) -> u64 {
        self.state.releases.load(Ordering::SeqCst)
    }

    pub fn last_generated(&self) -> Option<GeneratedRecord> {
        self.state
            .last_generated
            .lock()
            .ok()
            .and_then(|record| record.clone())
    }
}

#[async_trait]
impl ModelLoaderPort for FakeModelLoader {
    async fn load(&self) -> Result<LoadedModels, ModelError> {
        if self.config.fail_load {
            return Err(ModelError::load_failed(
                FAKE_MUSIC_MODEL_ID,
                "checkpoint directory is empty",
            ));
        }

        self.state.loads.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Fake models loaded");

        Ok(LoadedModels {
            music: Arc::new(FakeMusicPipeline {
                config: self.config.clone(),
                state: Arc::clone(&self.state),
            }),
            language: Arc::new(FakeLanguageModel),
            image: Arc::new(FakeImagePipeline),
        })
    }
}

/// 正弦波音乐管线
struct FakeMusicPipeline {
    config: FakeModelConfig,
    state: Arc<FakeState>,
}

impl FakeMusicPipeline {
    fn render(&self, params: &GenerationParams) -> Vec<u8> {
        let secs = params.audio_duration.min(self.config.max_render_secs).max(0.0);
        let frames = (secs * self.config.sample_rate as f64) as usize;
        let channels = self.config.channels.max(1) as usize;
        let freq = 220.0 + (params.seed.unwrap_or(0) % 440) as f32;
        let step = freq * 2.0 * std::f32::consts::PI / self.config.sample_rate as f32;

        let mut samples = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            let s = (i as f32 * step).sin() * 0.3;
            samples.extend(std::iter::repeat(s).take(channels));
        }
        encode_pcm16_wav(&samples, self.config.sample_rate, channels as u16)
    }
}

#[async_trait]
impl MusicPipelinePort for FakeMusicPipeline {
    fn model_id(&self) -> &str {
        FAKE_MUSIC_MODEL_ID
    }

    async fn generate(&self, params: &GenerationParams, save_path: &Path) -> Result<(), ModelError> {
        if self.config.fail_generate {
            // 模拟推理中途失败：留下半截文件
            let _ = tokio::fs::write(save_path, b"RIFF").await;
            return Err(ModelError::Backend("diffusion step diverged".to_string()));
        }

        let bytes = self.render(params);
        tokio::fs::write(save_path, &bytes)
            .await
            .map_err(|e| ModelError::Backend(format!("Failed to save audio: {}", e)))?;

        if let Ok(mut last) = self.state.last_generated.lock() {
            *last = Some(GeneratedRecord {
                path: save_path.to_path_buf(),
                bytes,
                params: params.clone(),
            });
        }
        Ok(())
    }

    async fn release(&self) -> Result<(), ModelError> {
        self.state.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 模板歌词语言模型
struct FakeLanguageModel;

#[async_trait]
impl LanguageModelPort for FakeLanguageModel {
    fn model_id(&self) -> &str {
        FAKE_LANGUAGE_MODEL_ID
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        _max_new_tokens: u32,
    ) -> Result<String, ModelError> {
        let description = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.trim())
            .unwrap_or_default();
        let system = messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str());

        let reply = match system {
            Some(STYLE_SYSTEM_PROMPT) => format!("{}, 90bpm", description),
            Some(CATEGORIES_SYSTEM_PROMPT) => "Lofi, Chill, Ambient".to_string(),
            _ => format!(
                "[verse]\n{}\n\n[chorus]\n{}, oh {}\n",
                description, description, description
            ),
        };
        Ok(reply)
    }

    async fn release(&self) -> Result<(), ModelError> {
        Ok(())
    }
}

struct FakeImagePipeline;

#[async_trait]
impl ImagePipelinePort for FakeImagePipeline {
    fn model_id(&self) -> &str {
        FAKE_IMAGE_MODEL_ID
    }

    async fn render(&self, _prompt: &str) -> Result<Vec<u8>, ModelError> {
        Ok(TINY_PNG.to_vec())
    }

    async fn release(&self) -> Result<(), ModelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::is_wav;

    #[tokio::test]
    async fn test_fake_music_writes_capped_wav() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FakeModelLoader::new(FakeModelConfig {
            sample_rate: 8000,
            channels: 1,
            max_render_secs: 0.5,
            ..Default::default()
        });
        let models = loader.load().await.unwrap();
        let path = dir.path().join("out.wav");

        models
            .music
            .generate(&GenerationParams::default(), &path)
            .await
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(is_wav(&bytes));
        // 44 字节头 + 0.5s * 8000Hz * 2 字节
        assert_eq!(bytes.len(), 44 + 8000);
        assert_eq!(loader.last_generated().unwrap().bytes, bytes);
    }

    #[tokio::test]
    async fn test_fake_lyrics_use_last_user_message() {
        let language = FakeLanguageModel;
        let text = language
            .complete(
                &[ChatMessage::system("be a poet"), ChatMessage::user("rainy tokyo")],
                64,
            )
            .await
            .unwrap();
        assert!(text.starts_with("[verse]\nrainy tokyo"));
        assert!(!text.contains("be a poet"));
    }

    #[tokio::test]
    async fn test_fake_language_follows_system_prompt() {
        let language = FakeLanguageModel;
        let style = language
            .complete(
                &[ChatMessage::system(STYLE_SYSTEM_PROMPT), ChatMessage::user("rainy tokyo")],
                64,
            )
            .await
            .unwrap();
        assert_eq!(style, "rainy tokyo, 90bpm");

        let categories = language
            .complete(
                &[ChatMessage::system(CATEGORIES_SYSTEM_PROMPT), ChatMessage::user("rainy tokyo")],
                64,
            )
            .await
            .unwrap();
        assert_eq!(categories, "Lofi, Chill, Ambient");
    }

    #[tokio::test]
    async fn test_release_counts_once_per_model_set() {
        let loader = FakeModelLoader::new(FakeModelConfig::default());
        let models = loader.load().await.unwrap();
        models.release_all().await;
        assert_eq!(loader.load_count(), 1);
        assert_eq!(loader.release_count(), 1);
    }
}
