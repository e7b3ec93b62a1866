use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use crate::ai::{generate_with_fallback, ContentGenerator, ImageEditService};
use crate::models::EncodedImage;
use crate::{prompts, Result};
use async_trait::async_trait;
use std::time::Duration;

const OPERATION: &str = "image edit";

pub struct GeminiEditClient {
    generator: Box<dyn ContentGenerator>,
    models: Vec<String>,
}

impl GeminiEditClient {
    pub fn new(api_key: String, models: Vec<String>) -> Self {
        Self::new_with_client(api_key, models, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, models: Vec<String>, client: reqwest::Client) -> Self {
        Self::with_generator(
            Box::new(GeminiHttpClient::new_with_client(
                api_key,
                Duration::from_secs(120),
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

    fn build_request(image: &EncodedImage, instruction: Option<&str>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::image(image),
                Part::text(prompts::edit_instruction(instruction)),
            ])],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            }),
        }
    }

    fn interpret(response: GenerateContentResponse) -> Result<Option<EncodedImage>> {
        Ok(response.first_inline_data().cloned().map(|inline| {
            tracing::debug!("Gemini returned image with mime_type: {}", inline.mime_type);
            EncodedImage::from(inline)
        }))
    }
}

#[async_trait]
impl ImageEditService for GeminiEditClient {
    async fn edit_image(
        &self,
        image: &EncodedImage,
        instruction: Option<&str>,
    ) -> Result<EncodedImage> {
        let payload = Self::build_request(image, instruction);

        generate_with_fallback(
            self.generator.as_ref(),
            OPERATION,
            &self.models,
            &payload,
            Self::interpret,
        )
        .await
    }
}
