//! Engine parameters: orchestrator runtime control.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime parameters of the orchestrator.
///
/// Built by the CLI from the `[engine]` and `[generation]` config sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Interval of the periodic context sync loop; `None` disables it.
    pub context_sync_interval: Option<Duration>,
    /// Sampling temperature passed to the text generation client.
    pub temperature: Option<f32>,
    /// Token limit passed to the text generation client.
    pub max_tokens: Option<u32>,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            context_sync_interval: None,
            temperature: Some(0.7),
            max_tokens: Some(1024),
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    /// Set the sync interval in seconds; `0` disables the loop.
    pub fn with_context_sync_secs(mut self, secs: u64) -> Self {
        self.context_sync_interval = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}
