//! Progress notification port
//!
//! Defines the interface for reporting progress during agent collaboration.

use conclave_domain::ConversationMode;

/// Callback for progress updates during collaboration
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console spinner, plain log lines, ...).
pub trait CollaborationProgress: Send + Sync {
    /// Called when a collaboration round starts
    fn on_collaboration_start(&self, mode: ConversationMode, total_agents: usize);

    /// Called when one agent has answered (or failed)
    fn on_agent_complete(&self, agent: &str, success: bool);

    /// Called when the round completes
    fn on_collaboration_complete(&self, mode: ConversationMode);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl CollaborationProgress for NoProgress {
    fn on_collaboration_start(&self, _mode: ConversationMode, _total_agents: usize) {}
    fn on_agent_complete(&self, _agent: &str, _success: bool) {}
    fn on_collaboration_complete(&self, _mode: ConversationMode) {}
}
