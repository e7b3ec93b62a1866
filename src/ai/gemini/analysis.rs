//! Filter analysis over Gemini with structured JSON output.

use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::ai::{generate_with_fallback, ContentGenerator, PhotoAnalysisService};
use crate::models::{AnalysisRequest, AnalysisResult};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const OPERATION: &str = "filter analysis";

pub struct GeminiAnalysisClient {
    generator: Box<dyn ContentGenerator>,
    models: Vec<String>,
}

impl GeminiAnalysisClient {
    pub fn new(api_key: String, models: Vec<String>) -> Self {
        Self::new_with_client(api_key, models, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, models: Vec<String>, client: reqwest::Client) -> Self {
        Self::with_generator(
            Box::new(GeminiHttpClient::new_with_client(
                api_key,
                Duration::from_secs(60),
                client,
            )),
            models,
        )
    }

    pub fn with_generator(generator: Box<dyn ContentGenerator>, models: Vec<String>) -> Self {
        Self { generator, models }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn build_request(request: &AnalysisRequest) -> GenerateContentRequest {
        let mut parts = vec![Part::image(&request.image)];
        if let Some(reference) = &request.reference {
            parts.push(Part::image(reference));
        }
        parts.push(Part::text(prompts::analysis_instruction(
            request.subject,
            &request.instruction,
            request.reference.is_some(),
        )));

        GenerateContentRequest {
            contents: vec![Content::user(parts)],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema()),
                ..Default::default()
            }),
        }
    }

    fn interpret(response: GenerateContentResponse) -> Result<Option<AnalysisResult>> {
        let Some(text) = response.text() else {
            return Ok(None);
        };

        serde_json::from_str(&text).map(Some).map_err(|e| {
            tracing::error!("Failed to parse analysis response: {}\nText: {}", e, text);
            // The position is left out so a line or column number cannot read as a status code.
            Error::AiProvider(format!(
                "Failed to parse analysis response ({:?} error)",
                e.classify()
            ))
        })
    }
}

/// Gemini `responseSchema` for [`AnalysisResult`].
fn response_schema() -> serde_json::Value {
    let number = serde_json::json!({ "type": "NUMBER" });
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "reasoning": { "type": "STRING" },
            "suggestedSettings": {
                "type": "OBJECT",
                "properties": {
                    "brightness": number,
                    "contrast": number,
                    "saturation": number,
                    "sepia": number,
                    "grayscale": number,
                    "hueRotate": number,
                    "blur": number
                }
            }
        },
        "required": ["reasoning", "suggestedSettings"]
    })
}

#[async_trait]
impl PhotoAnalysisService for GeminiAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let payload = Self::build_request(request);

        let result = generate_with_fallback(
            self.generator.as_ref(),
            OPERATION,
            &self.models,
            &payload,
            Self::interpret,
        )
        .await?;

        tracing::info!("Analysis suggested: {}", result.suggested_settings.css());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::gemini::test_support;
    use crate::ai::mock::{MockContentGenerator, MockReply};
    use crate::models::{EncodedImage, SubjectType};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCENARIO_JSON: &str = r#"{"reasoning":"bright portrait","suggestedSettings":{"brightness":110,"contrast":105,"saturation":100}}"#;

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn photo() -> EncodedImage {
        EncodedImage::from_bytes(&[0xFF, 0xD8, 0xFF, 0xE0])
    }

    fn request(reference: Option<EncodedImage>) -> AnalysisRequest {
        AnalysisRequest {
            image: photo(),
            reference,
            subject: SubjectType::Portrait,
            instruction: "make it glow".to_string(),
        }
    }

    fn make_client(generator: &MockContentGenerator, ids: &[&str]) -> GeminiAnalysisClient {
        GeminiAnalysisClient::with_generator(Box::new(generator.clone()), models(ids))
    }

    #[tokio::test]
    async fn test_rate_limited_model_falls_back_to_next() {
        let generator = MockContentGenerator::new()
            .with_reply(MockReply::error("429 rate limited"))
            .with_reply(MockReply::text(SCENARIO_JSON));

        let result = make_client(&generator, &["m1", "m2"])
            .analyze(&request(None))
            .await
            .unwrap();

        assert_eq!(result.reasoning, "bright portrait");
        assert_eq!(result.suggested_settings.brightness, 110.0);
        assert_eq!(result.suggested_settings.contrast, 105.0);
        assert_eq!(result.suggested_settings.saturation, 100.0);
        assert_eq!(result.suggested_settings.sepia, 0.0);
        assert_eq!(generator.requested_models(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_missing_text_falls_through() {
        let generator = MockContentGenerator::new()
            .with_reply(MockReply::empty())
            .with_reply(MockReply::text(SCENARIO_JSON));

        let result = make_client(&generator, &["m1", "m2"])
            .analyze(&request(None))
            .await
            .unwrap();

        assert_eq!(result.reasoning, "bright portrait");
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_malformed_json_is_fatal() {
        let generator = MockContentGenerator::new()
            .with_reply(MockReply::text("not json at all"))
            .with_reply(MockReply::text(SCENARIO_JSON));

        let err = make_client(&generator, &["m1", "m2"])
            .analyze(&request(None))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AiProvider(ref m) if m.starts_with("Failed to parse")));
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_position_is_not_a_capacity_marker() {
        // serde_json would report "line 503 column 1" for this body.
        let garbled = format!("{}x", "\n".repeat(502));
        let generator = MockContentGenerator::new()
            .with_reply(MockReply::text(&garbled))
            .with_reply(MockReply::text(SCENARIO_JSON));

        let err = make_client(&generator, &["m1", "m2"])
            .analyze(&request(None))
            .await
            .unwrap_err();

        assert!(!err.is_capacity_error());
        assert!(!err.to_string().contains("line"));
        assert_eq!(generator.call_count(), 1);
    }

    #[test]
    fn test_request_includes_reference_image_and_clause() {
        let reference = EncodedImage::from_bytes(&[0x89, 0x50, 0x4E, 0x47]);
        let payload = GeminiAnalysisClient::build_request(&request(Some(reference)));

        let parts = &payload.contents[0].parts;
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], Part::InlineData { inline_data } if inline_data.mime_type == "image/jpeg"));
        assert!(matches!(&parts[1], Part::InlineData { inline_data } if inline_data.mime_type == "image/png"));
        match &parts[2] {
            Part::Text { text } => {
                assert!(text.contains("make it glow"));
                assert!(text.contains("style reference"));
            }
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[test]
    fn test_request_without_reference_has_two_parts() {
        let payload = GeminiAnalysisClient::build_request(&request(None));
        assert_eq!(payload.contents[0].parts.len(), 2);

        let config = payload.generation_config.unwrap();
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
        let schema = config.response_schema.unwrap();
        assert_eq!(
            schema["properties"]["suggestedSettings"]["properties"]["hueRotate"]["type"],
            "NUMBER"
        );
    }

    #[tokio::test]
    async fn test_http_fallback_from_unavailable_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(test_support::model_path("m1")))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(test_support::model_path("m2")))
            .and(body_string_contains("\"responseSchema\""))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(test_support::text_response(SCENARIO_JSON)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let http = GeminiHttpClient::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let client = GeminiAnalysisClient::with_generator(Box::new(http), models(&["m1", "m2"]));

        let result = client.analyze(&request(None)).await.unwrap();
        assert_eq!(result.suggested_settings.brightness, 110.0);
    }

    #[tokio::test]
    async fn test_http_forbidden_stops_fallback() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(test_support::model_path("m1")))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(test_support::model_path("m2")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(test_support::text_response(SCENARIO_JSON)),
            )
            .expect(0)
            .mount(&server)
            .await;

        let http = GeminiHttpClient::new("key".to_string(), Duration::from_secs(5))
            .with_base_url(server.uri());
        let client = GeminiAnalysisClient::with_generator(Box::new(http), models(&["m1", "m2"]));

        let err = client.analyze(&request(None)).await.unwrap_err();
        assert!(err.is_access_denied());
    }
}
