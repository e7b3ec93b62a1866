//! Ordered model fallback for `generateContent` calls.
//!
//! Candidates are tried one at a time, best first. Capacity-related failures
//! (rate limit, quota, temporary unavailability) advance to the next model;
//! every other failure is returned as-is without touching the remaining
//! candidates.

use super::gemini::types::{GenerateContentRequest, GenerateContentResponse};
use super::ContentGenerator;
use crate::{Error, Result};
use tracing::{info, warn};

/// Run `request` against `models` in order and return the first usable
/// result produced by `interpret`.
///
/// `interpret` returns `Ok(None)` when a response is well-formed but carries
/// nothing usable; that model is skipped. An `Err` from `interpret` is
/// classified exactly like a transport failure.
///
/// When every candidate fails, the last capacity error is returned verbatim.
/// If no capacity error was seen, [`Error::ModelsExhausted`] lists the models
/// that returned no content.
pub async fn generate_with_fallback<T, F>(
    generator: &dyn ContentGenerator,
    operation: &'static str,
    models: &[String],
    request: &GenerateContentRequest,
    interpret: F,
) -> Result<T>
where
    T: Send,
    F: Fn(GenerateContentResponse) -> Result<Option<T>> + Send + Sync,
{
    if models.is_empty() {
        return Err(Error::Config(format!(
            "No candidate models configured for {}",
            operation
        )));
    }

    let mut last_error: Option<Error> = None;
    let mut empty_models = Vec::new();

    for (index, model) in models.iter().enumerate() {
        info!(
            "[{}] Trying model {} ({}/{})",
            operation,
            model,
            index + 1,
            models.len()
        );

        let outcome = generator
            .generate_content(model, request)
            .await
            .and_then(&interpret);

        match outcome {
            Ok(Some(result)) => {
                info!("[{}] Model {} succeeded", operation, model);
                return Ok(result);
            }
            Ok(None) => {
                warn!("[{}] Model {} returned no usable content", operation, model);
                empty_models.push(model.clone());
            }
            Err(e) if e.is_capacity_error() => {
                warn!(
                    "[{}] Model {} is over capacity: {}. Trying next model...",
                    operation, model, e
                );
                last_error = Some(e);
            }
            Err(e) => {
                warn!("[{}] Model {} failed: {}", operation, model, e);
                return Err(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::ModelsExhausted {
        operation,
        empty_models,
    }))
}
