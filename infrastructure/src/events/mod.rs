//! Event bus adapters.

mod broadcast_bus;

pub use broadcast_bus::{BroadcastEventBus, CHANNEL_CAPACITY, WILDCARD_TOPIC};
