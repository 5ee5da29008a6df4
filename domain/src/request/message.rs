//! Transcript message exchanged between agents

use super::response::Response;
use crate::core::time::{clamp_confidence, current_timestamp};
use serde::{Deserialize, Serialize};

/// One line of a multi-agent transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub content: String,
    /// Display name of the agent that produced the message
    pub sender: String,
    /// Milliseconds since epoch
    pub timestamp: u64,
    pub confidence: f32,
}

impl AgentMessage {
    pub fn new(content: impl Into<String>, sender: impl Into<String>, confidence: f32) -> Self {
        Self {
            content: content.into(),
            sender: sender.into(),
            timestamp: current_timestamp(),
            confidence: clamp_confidence(confidence),
        }
    }

    /// Flatten an agent response into a transcript line.
    ///
    /// Failed responses become `"Error with <sender>: <message>"` at zero confidence.
    pub fn from_response(sender: impl Into<String>, response: &Response) -> Self {
        let sender = sender.into();
        match &response.error {
            Some(error) => Self {
                content: format!("Error with {}: {}", sender, error),
                sender,
                timestamp: response.timestamp,
                confidence: 0.0,
            },
            None => Self {
                content: response.content.clone(),
                sender,
                timestamp: response.timestamp,
                confidence: clamp_confidence(response.confidence),
            },
        }
    }
}
