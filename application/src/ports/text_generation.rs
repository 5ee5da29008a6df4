//! Text generation port
//!
//! The engine only needs something that turns a prompt into text. It is used
//! for the final synthesis of transcendent-tier requests.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while generating text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Prompt-to-text backend
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// `Ok(None)` means the backend answered but produced no text.
    async fn generate(
        &self,
        prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<Option<String>, GenerationError>;
}
