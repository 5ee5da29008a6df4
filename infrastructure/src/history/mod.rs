//! History persistence.
//!
//! Provides [`JsonlHistoryStore`], a JSONL file that backs the orchestrator's
//! `save_history` / `load_history` callbacks.

mod jsonl_store;

pub use jsonl_store::{HistoryStoreError, JsonlHistoryStore, SAVED_AT_KEY};
