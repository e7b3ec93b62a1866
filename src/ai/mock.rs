use super::gemini::types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};
use super::{ContentGenerator, ImageEditService, PhotoAnalysisService};
use crate::models::{AnalysisRequest, AnalysisResult, EncodedImage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted outcome for [`MockContentGenerator`].
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(GenerateContentResponse),
    Error(String),
}

impl MockReply {
    pub fn text(text: &str) -> Self {
        Self::with_parts(vec![Part::text(text)])
    }

    pub fn image(mime_type: &str, data: &str) -> Self {
        Self::with_parts(vec![Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            },
        }])
    }

    /// A well-formed response with no candidates.
    pub fn empty() -> Self {
        MockReply::Response(GenerateContentResponse::default())
    }

    /// Fails with `Error::AiProvider(message)`.
    pub fn error(message: &str) -> Self {
        MockReply::Error(message.to_string())
    }

    pub fn with_parts(parts: Vec<Part>) -> Self {
        MockReply::Response(GenerateContentResponse {
            candidates: vec![Candidate {
                content: Content {
                    role: Some("model".to_string()),
                    parts,
                },
            }],
        })
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub request: GenerateContentRequest,
}

/// Scripted [`ContentGenerator`] that replays replies in order and records
/// every request it receives.
#[derive(Clone, Default)]
pub struct MockContentGenerator {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockContentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requested_models(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.model.clone())
            .collect()
    }
}

#[async_trait]
impl ContentGenerator for MockContentGenerator {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            request: request.clone(),
        });

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Error(message)) => Err(Error::AiProvider(message)),
            None => Err(Error::AiProvider(format!(
                "No scripted reply left for model {}",
                model
            ))),
        }
    }
}

/// Canned [`PhotoAnalysisService`] for app-level tests.
#[derive(Clone, Default)]
pub struct MockAnalysisClient {
    result: Option<AnalysisResult>,
    failure: Option<String>,
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
}

impl MockAnalysisClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, result: AnalysisResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Every call fails with `Error::AiProvider(message)`.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoAnalysisService for MockAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }
        Ok(self.result.clone().unwrap_or_else(|| AnalysisResult {
            reasoning: "No changes needed".to_string(),
            suggested_settings: Default::default(),
        }))
    }
}

/// Canned [`ImageEditService`] for app-level tests.
#[derive(Clone, Default)]
pub struct MockEditClient {
    image: Option<EncodedImage>,
    failure: Option<String>,
    instructions: Arc<Mutex<Vec<Option<String>>>>,
}

impl MockEditClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: EncodedImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn instructions(&self) -> Vec<Option<String>> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageEditService for MockEditClient {
    async fn edit_image(
        &self,
        image: &EncodedImage,
        instruction: Option<&str>,
    ) -> Result<EncodedImage> {
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.map(str::to_string));

        if let Some(message) = &self.failure {
            return Err(Error::AiProvider(message.clone()));
        }
        // Echo the input when nothing was scripted.
        Ok(self.image.clone().unwrap_or_else(|| image.clone()))
    }
}
