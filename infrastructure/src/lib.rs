//! Infrastructure layer for conclave
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: configuration loading, history persistence, the event
//! bus, persona agents and text generation clients.

pub mod agents;
pub mod config;
pub mod events;
pub mod generation;
pub mod history;

// Re-export commonly used types
pub use agents::{PersonaAgent, build_roster, default_roster};
pub use config::{ConfigLoader, FileAgentConfig, FileConfig, TextProvider};
pub use events::BroadcastEventBus;
#[cfg(feature = "http-client")]
pub use generation::HttpTextClient;
pub use generation::{OfflineTextClient, build_text_client};
pub use history::{HistoryStoreError, JsonlHistoryStore};
