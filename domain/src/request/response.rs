//! Response value object

use crate::core::time::{clamp_confidence, current_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Content used by the aggregator when a group has no candidates
pub const NO_RESPONSE_CONTENT: &str = "No response";

/// Error used by the aggregator when a group has no candidates
pub const NO_RESPONSES_ERROR: &str = "No responses to aggregate";

/// Answer produced by an agent, by a fusion pipeline, or by the engine itself.
///
/// The constructors keep `confidence` within `[0.0, 1.0]`; a response built
/// field by field or deserialized must pass through [`Response::normalized`]
/// before the engine hands it out. A response carrying an `error` is never
/// treated as a success signal, whatever its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Milliseconds since epoch
    pub timestamp: u64,
}

impl Response {
    pub fn new(content: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            confidence: clamp_confidence(confidence),
            error: None,
            agent_name: None,
            metadata: BTreeMap::new(),
            timestamp: current_timestamp(),
        }
    }

    /// A successful response
    pub fn success(content: impl Into<String>, confidence: f32) -> Self {
        Self::new(content, confidence)
    }

    /// An error response with empty content and zero confidence
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new("", 0.0)
        }
    }

    /// The error shape recorded for an agent that failed inside a batch
    pub fn agent_failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            error: Some(message.clone()),
            ..Self::new(format!("Error: {}", message), 0.0)
        }
    }

    /// An intermediate response (confidence 0.5, no error)
    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(message, 0.5)
    }

    /// Sentinel substituted for an empty consensus group
    pub fn no_consensus() -> Self {
        Self {
            error: Some(NO_RESPONSES_ERROR.to_string()),
            ..Self::new(NO_RESPONSE_CONTENT, 0.0)
        }
    }

    pub fn with_agent_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Bring a confidence set outside the constructors back into `[0.0, 1.0]`
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self
    }

    /// Force the confidence to zero and mark the response as failed
    pub fn into_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self.confidence = 0.0;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.confidence < 1.0 && self.error.is_none()
    }

    /// Confidence as seen by the consensus reducer: errors and NaN count as zero
    pub fn effective_confidence(&self) -> f32 {
        if self.is_error() {
            0.0
        } else {
            clamp_confidence(self.confidence)
        }
    }
}
