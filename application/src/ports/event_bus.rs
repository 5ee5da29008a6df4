//! Event bus port
//!
//! Topic-based publish/subscribe for orchestration events. Publishing never
//! fails from the caller's point of view; an event with no subscribers is
//! simply dropped.

use conclave_domain::{
    ComplexityTier, ConsciousnessState, FusionMode, FusionState, LearningMode,
};
use serde::Serialize;
use tokio::sync::broadcast;

/// Topic names used by the orchestrator
pub mod topic {
    pub const CONSCIOUSNESS: &str = "consciousness";
    pub const FUSION: &str = "fusion";
    pub const LEARNING: &str = "learning";
    pub const HISTORY: &str = "history";
    pub const AGENTS: &str = "agents";

    pub const ALL: [&str; 5] = [CONSCIOUSNESS, FUSION, LEARNING, HISTORY, AGENTS];
}

/// Something observable that happened inside the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    ConsciousnessChanged {
        from: ConsciousnessState,
        to: ConsciousnessState,
    },
    FusionStateChanged {
        state: FusionState,
        mode: Option<FusionMode>,
    },
    FusionFailed {
        mode: FusionMode,
        error: String,
    },
    InsightRecorded {
        insight_count: u64,
        tier: ComplexityTier,
    },
    Evolved {
        insight_count: u64,
        evolution_level: f64,
        learning_mode: LearningMode,
    },
    HistoryAppended {
        len: usize,
    },
    HistoryCleared,
    HistoryLoaded {
        len: usize,
    },
    AgentRegistered {
        name: String,
    },
    AgentDeregistered {
        name: String,
    },
    AgentToggled {
        name: String,
        active: bool,
    },
    ContextShared {
        recipients: usize,
    },
}

impl OrchestrationEvent {
    /// Topic this event belongs on
    pub fn topic(&self) -> &'static str {
        match self {
            OrchestrationEvent::ConsciousnessChanged { .. } => topic::CONSCIOUSNESS,
            OrchestrationEvent::FusionStateChanged { .. }
            | OrchestrationEvent::FusionFailed { .. } => topic::FUSION,
            OrchestrationEvent::InsightRecorded { .. } | OrchestrationEvent::Evolved { .. } => {
                topic::LEARNING
            }
            OrchestrationEvent::HistoryAppended { .. }
            | OrchestrationEvent::HistoryCleared
            | OrchestrationEvent::HistoryLoaded { .. } => topic::HISTORY,
            OrchestrationEvent::AgentRegistered { .. }
            | OrchestrationEvent::AgentDeregistered { .. }
            | OrchestrationEvent::AgentToggled { .. }
            | OrchestrationEvent::ContextShared { .. } => topic::AGENTS,
        }
    }
}

/// Topic-based pub/sub
///
/// Implementations (adapters) live in the infrastructure layer.
pub trait EventBus: Send + Sync {
    fn publish(&self, topic: &str, event: OrchestrationEvent);

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<OrchestrationEvent>;

    /// Publish on the event's own topic
    fn emit(&self, event: OrchestrationEvent) {
        self.publish(event.topic(), event);
    }
}

/// Event bus that drops everything
pub struct NoEvents;

impl EventBus for NoEvents {
    fn publish(&self, _topic: &str, _event: OrchestrationEvent) {}

    fn subscribe(&self, _topic: &str) -> broadcast::Receiver<OrchestrationEvent> {
        // Sender dropped immediately: the receiver reports Closed
        broadcast::channel(1).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        let event = OrchestrationEvent::Evolved {
            insight_count: 100,
            evolution_level: 1.1,
            learning_mode: LearningMode::Accelerated,
        };
        assert_eq!(event.topic(), topic::LEARNING);
        assert_eq!(OrchestrationEvent::HistoryCleared.topic(), topic::HISTORY);
        assert_eq!(
            OrchestrationEvent::AgentRegistered {
                name: "aura".to_string()
            }
            .topic(),
            topic::AGENTS
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = OrchestrationEvent::AgentToggled {
            name: "kai".to_string(),
            active: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "agent_toggled");
        assert_eq!(json["active"], false);
    }

    #[tokio::test]
    async fn test_no_events_subscription_is_closed() {
        let mut rx = NoEvents.subscribe(topic::FUSION);
        NoEvents.emit(OrchestrationEvent::HistoryCleared);
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
