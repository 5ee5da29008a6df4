//! Topic-based event bus on tokio broadcast channels
//!
//! One broadcast channel per topic, created on first use. Publishing to a
//! topic nobody listens to is not an error; slow subscribers lag instead of
//! blocking the publisher.

use conclave_application::{EventBus, OrchestrationEvent};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use tracing::trace;

/// Channel capacity for each topic
pub const CHANNEL_CAPACITY: usize = 256;

/// Subscribing to this topic receives every published event
pub const WILDCARD_TOPIC: &str = "*";

/// In-process pub/sub keyed by topic
#[derive(Default)]
pub struct BroadcastEventBus {
    topics: RwLock<HashMap<String, broadcast::Sender<OrchestrationEvent>>>,
}

impl BroadcastEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live receivers on a topic
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    fn sender(&self, topic: &str) -> Option<broadcast::Sender<OrchestrationEvent>> {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .cloned()
    }
}

impl EventBus for BroadcastEventBus {
    fn publish(&self, topic: &str, event: OrchestrationEvent) {
        trace!(topic, ?event, "Publishing event");
        if let Some(sender) = self.sender(WILDCARD_TOPIC) {
            // No receivers is fine
            let _ = sender.send(event.clone());
        }
        if topic != WILDCARD_TOPIC
            && let Some(sender) = self.sender(topic)
        {
            let _ = sender.send(event);
        }
    }

    fn subscribe(&self, topic: &str) -> broadcast::Receiver<OrchestrationEvent> {
        self.topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }
}
