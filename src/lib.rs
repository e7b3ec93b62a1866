//! AI-assisted photo retouching
//!
//! Suggests declarative filter settings for a photo, or generates an edited
//! image, by calling Gemini models in a fixed preference order and falling
//! back to cheaper models when a model is over capacity.

pub mod ai;
pub mod app;
pub mod error;
pub mod filters;
pub mod models;
pub mod prompts;
pub mod session;

pub use error::{Error, Result};
