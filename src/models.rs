//! Data models and structures
//!
//! Defines the images, analysis requests/results and configuration shared by
//! the AI clients, the editor session and the CLI.

use crate::ai::gemini::client::DEFAULT_BASE_URL;
use crate::ai::mime::{detect_image_mime, extension_for_mime};
use crate::filters::FilterSettings;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_ANALYSIS_MODELS: [&str; 2] = ["gemini-3-pro-preview", "gemini-2.5-flash"];
pub const DEFAULT_EDIT_MODELS: [&str; 2] = ["gemini-3-pro-image-preview", "gemini-2.5-flash-image"];

/// Base64-encoded image together with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: detect_image_mime(bytes).to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() {
            return Err(Error::InvalidImage(format!(
                "{} is empty",
                path.display()
            )));
        }
        Ok(Self::from_bytes(&bytes))
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| Error::InvalidImage(format!("Failed to decode base64 image: {}", e)))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// File extension (without dot) matching the MIME type.
    pub fn extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    #[default]
    Nature,
    Urban,
    Portrait,
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectType::Nature => f.write_str("nature"),
            SubjectType::Urban => f.write_str("urban"),
            SubjectType::Portrait => f.write_str("portrait"),
        }
    }
}

impl FromStr for SubjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nature" => Ok(SubjectType::Nature),
            "urban" => Ok(SubjectType::Urban),
            "portrait" => Ok(SubjectType::Portrait),
            other => Err(Error::InvalidInput(format!(
                "Unknown subject type '{}'. Expected nature, urban or portrait",
                other
            ))),
        }
    }
}

/// Input for a filter analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub image: EncodedImage,
    /// Optional second image whose look should be matched.
    pub reference: Option<EncodedImage>,
    pub subject: SubjectType,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub reasoning: String,
    #[serde(default)]
    pub suggested_settings: FilterSettings,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub analysis_models: Vec<String>,
    pub edit_models: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let analysis_models = match std::env::var("ANALYSIS_MODELS") {
            Ok(raw) => parse_model_list(&raw)?,
            Err(_) => default_models(&DEFAULT_ANALYSIS_MODELS),
        };
        let edit_models = match std::env::var("EDIT_MODELS") {
            Ok(raw) => parse_model_list(&raw)?,
            Err(_) => default_models(&DEFAULT_EDIT_MODELS),
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            analysis_models,
            edit_models,
        })
    }
}

pub fn default_models(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Parse a comma-separated candidate list, keeping order and dropping blanks.
pub fn parse_model_list(raw: &str) -> Result<Vec<String>> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if models.is_empty() {
        return Err(Error::Config(format!(
            "Model list '{}' contains no model ids",
            raw
        )));
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_parses_partial_settings() {
        let result: AnalysisResult = serde_json::from_str(
            r#"{"reasoning":"bright portrait","suggestedSettings":{"brightness":110,"contrast":105,"saturation":100}}"#,
        )
        .unwrap();

        assert_eq!(result.reasoning, "bright portrait");
        assert_eq!(result.suggested_settings.brightness, 110.0);
        assert_eq!(result.suggested_settings.blur, 0.0);
    }

    #[test]
    fn test_subject_type_round_trips_through_strings() {
        assert_eq!("Portrait".parse::<SubjectType>().unwrap(), SubjectType::Portrait);
        assert_eq!(SubjectType::Urban.to_string(), "urban");
        assert!("food".parse::<SubjectType>().is_err());
    }

    #[test]
    fn test_parse_model_list_keeps_order() {
        let models = parse_model_list(" a , b,,c ").unwrap();
        assert_eq!(models, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_model_list_rejects_empty() {
        assert!(matches!(parse_model_list(" , "), Err(Error::Config(_))));
    }

    #[test]
    fn test_encoded_image_from_bytes() {
        let image = EncodedImage::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "/9j/4A==");
        assert_eq!(image.extension(), "jpg");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,/9j/4A==");
        assert_eq!(image.decode().unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn test_decode_rejects_invalid_base64() {
        let image = EncodedImage {
            mime_type: "image/png".to_string(),
            data: "!!!".to_string(),
        };
        assert!(matches!(image.decode(), Err(Error::InvalidImage(_))));
    }
}
