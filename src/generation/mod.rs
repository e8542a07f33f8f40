//! Hosted text generation
//!
//! [`GenerationClient`] is the seam the answer composer talks to;
//! [`GeminiClient`] implements it over the Gemini REST API.

pub mod gemini;

pub use gemini::{GeminiClient, DEFAULT_API_BASE, DEFAULT_MODEL};

use async_trait::async_trait;

use crate::errors::Result;

/// Single-prompt text generation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for one textual prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}
