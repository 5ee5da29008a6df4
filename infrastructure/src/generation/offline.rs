//! Deterministic local completions.
//!
//! Used when no network backend is configured. The completion restates the
//! last instruction line of the prompt so output stays traceable to input.

use async_trait::async_trait;
use conclave_application::{GenerationError, TextGenerationClient};

/// Longest completion produced, in characters
const MAX_COMPLETION_CHARS: usize = 280;

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTextClient;

impl OfflineTextClient {
    pub fn new() -> Self {
        Self
    }

    fn complete(prompt: &str, max_tokens: Option<u32>) -> Option<String> {
        let line = prompt.lines().rev().map(str::trim).find(|l| !l.is_empty())?;
        // Rough budget: four characters per token
        let limit = max_tokens
            .map(|tokens| (tokens as usize).saturating_mul(4))
            .unwrap_or(MAX_COMPLETION_CHARS)
            .min(MAX_COMPLETION_CHARS);
        let text: String = line.chars().take(limit).collect();
        (!text.is_empty()).then(|| format!("Considered: {}", text))
    }
}

#[async_trait]
impl TextGenerationClient for OfflineTextClient {
    async fn generate(
        &self,
        prompt: &str,
        _temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<Option<String>, GenerationError> {
        Ok(Self::complete(prompt, max_tokens))
    }
}
