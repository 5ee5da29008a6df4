//! Single-answer synthesis over a transcript

use crate::core::time::clamp_confidence;
use crate::request::message::AgentMessage;

/// Join every message not sent by `self_name` as `"sender: content"` separated by `" | "`
pub fn synthesize(messages: &[AgentMessage], self_name: &str) -> String {
    messages
        .iter()
        .filter(|message| message.sender != self_name)
        .map(|message| format!("{}: {}", message.sender, message.content))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Arithmetic mean of all confidences, clamped to `[0, 1]`; `0.0` when empty
pub fn confidence(messages: &[AgentMessage]) -> f32 {
    if messages.is_empty() {
        return 0.0;
    }
    let total: f64 = messages.iter().map(|m| f64::from(m.confidence)).sum();
    clamp_confidence((total / messages.len() as f64) as f32)
}
