//! Generative model boundary.
//!
//! The advisory handlers only see the [`GenerativeModel`] trait. Production
//! wiring injects a [`GeminiClient`]; tests inject a [`FakeModel`].

mod gemini;

#[cfg(test)]
mod fake;

pub use gemini::GeminiClient;

#[cfg(test)]
pub use fake::FakeModel;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a model invocation. Every variant means the service could not
/// produce an answer; none of them are retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Model request failed: {0}")]
    Network(String),

    #[error("Model request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Model service returned error {status}: {message}")]
    ServiceUnavailable { status: u16, message: String },

    #[error("Failed to parse model response envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Model response contained no text")]
    EmptyResponse,
}

/// Image bytes sent inline with a multimodal prompt
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A text (optionally text + image) completion model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send the prompt and return the model's raw text answer.
    async fn generate(&self, prompt: &str, image: Option<&InlineImage>)
        -> Result<String, ModelError>;

    /// Model used for text-only prompts
    fn text_model(&self) -> &str;

    /// Model used for prompts carrying an image
    fn vision_model(&self) -> &str;
}
