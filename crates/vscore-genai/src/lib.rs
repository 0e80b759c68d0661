//! Generative scoring model client.
//!
//! The pipeline talks to a [`GenerativeModel`]; [`GeminiClient`] is the
//! production implementation with ordered model fallback.

pub mod error;
pub mod gemini;
pub mod metrics;
pub mod model;

pub use error::{GenAiError, GenAiResult};
pub use gemini::{GeminiClient, GeminiConfig};
pub use model::{strip_code_fences, GenerativeModel, ResponseFormat};
