//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

/// Substrings that mark a provider failure as capacity-related (rate limit,
/// quota exhaustion, temporary unavailability).
const CAPACITY_MARKERS: [&str; 3] = ["429", "503", "Quota"];

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Exhausted all models for {operation}; no usable content from: {}", .empty_models.join(", "))]
    ModelsExhausted {
        operation: &'static str,
        empty_models: Vec<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid image data: {0}")]
    InvalidImage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this failure should advance to the next model candidate.
    ///
    /// Classification is textual: the rendered message must mention HTTP
    /// 429, HTTP 503 or a quota marker.
    pub fn is_capacity_error(&self) -> bool {
        let message = self.to_string();
        CAPACITY_MARKERS
            .iter()
            .any(|marker| message.contains(marker))
    }

    /// Whether the provider refused access (HTTP 403).
    pub fn is_access_denied(&self) -> bool {
        match self {
            Error::Http(e) => e.status() == Some(reqwest::StatusCode::FORBIDDEN),
            other => other.to_string().contains("403"),
        }
    }

    /// Short message suitable for showing to the person using the editor.
    pub fn user_message(&self) -> String {
        if self.is_access_denied() {
            "Access denied. Check that your API key is valid and has access to the requested model."
                .to_string()
        } else {
            "Something went wrong while processing the image. Please try again.".to_string()
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
