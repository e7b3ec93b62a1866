//! AI service integration for filter analysis and generative edits
//!
//! Both operations talk to Gemini's `generateContent` endpoint through
//! [`fallback::generate_with_fallback`], which walks an ordered list of model
//! candidates.

pub mod fallback;
pub mod gemini;
pub mod mime;
pub mod mock;

pub use fallback::generate_with_fallback;
pub use gemini::{GeminiAnalysisClient, GeminiEditClient, GeminiHttpClient};
pub use mock::{MockAnalysisClient, MockContentGenerator, MockEditClient, MockReply};

use crate::models::{AnalysisRequest, AnalysisResult, EncodedImage};
use crate::Result;
use async_trait::async_trait;
use gemini::types::{GenerateContentRequest, GenerateContentResponse};

/// Transport seam: one `generateContent` call against one model.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

/// Suggests filter settings for a photo.
#[async_trait]
pub trait PhotoAnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult>;
}

/// Produces a new image from a photo and an edit instruction.
#[async_trait]
pub trait ImageEditService: Send + Sync {
    async fn edit_image(&self, image: &EncodedImage, instruction: Option<&str>)
        -> Result<EncodedImage>;
}
