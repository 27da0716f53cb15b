//! Data Transfer Objects

use serde::Serialize;

use crate::application::GenerateMusicResponse;

// ============================================================================
// Generate DTOs
// ============================================================================

/// 生成接口响应体
///
/// 成功时只返回音频字段，不套统一信封
#[derive(Debug, Serialize)]
pub struct GenerateMusicResponseDto {
    /// Base64 编码的 WAV
    pub audio_data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_data: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl From<GenerateMusicResponse> for GenerateMusicResponseDto {
    fn from(response: GenerateMusicResponse) -> Self {
        Self {
            audio_data: response.audio_data,
            cover_image_data: response.cover_image_data,
            categories: response.categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_is_omitted_when_absent() {
        let dto = GenerateMusicResponseDto::from(GenerateMusicResponse {
            audio_data: "UklGRg==".to_string(),
            cover_image_data: None,
            categories: Vec::new(),
            audio_size: 4,
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json, serde_json::json!({ "audio_data": "UklGRg==" }));
    }

    #[test]
    fn test_categories_are_listed_when_present() {
        let dto = GenerateMusicResponseDto::from(GenerateMusicResponse {
            audio_data: "UklGRg==".to_string(),
            cover_image_data: None,
            categories: vec!["Lofi".to_string(), "Chill".to_string()],
            audio_size: 4,
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["categories"], serde_json::json!(["Lofi", "Chill"]));
        assert!(json.get("cover_image_data").is_none());
    }
}
