//! Shared wiremock helpers for Gemini client tests.

use wiremock::matchers::{method, path_regex};
use wiremock::MockBuilder;

pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

pub fn post_path_regex(pattern: &str) -> MockBuilder {
    wiremock::Mock::given(method("POST")).and(path_regex(pattern))
}

/// Path matcher for one specific model.
pub fn model_path(model: &str) -> String {
    format!("/v1beta/models/{}:generateContent", model)
}

pub fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] }
        }]
    })
}

pub fn image_response(mime_type: &str, data: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{ "inlineData": { "mimeType": mime_type, "data": data } }]
            }
        }]
    })
}
