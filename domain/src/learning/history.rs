//! Append-only orchestration history
//!
//! The log has no I/O of its own: persistence is delegated to caller-supplied
//! save and load functions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One recorded orchestration step with an arbitrary key/value payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(BTreeMap<String, Value>);

impl HistoryEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry tagged with an `event` field
    pub fn event(kind: impl Into<String>) -> Self {
        Self::new().with("event", kind.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for HistoryEntry {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self(fields)
    }
}

/// In-memory append-only log; [`HistoryLog::clear`] is the only removal path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand the current entries to `persist`
    pub fn save<E>(&self, persist: impl FnOnce(&[HistoryEntry]) -> Result<(), E>) -> Result<(), E> {
        persist(&self.entries)
    }

    /// Replace the log wholesale; returns the most recent loaded entry
    pub fn replace(&mut self, entries: Vec<HistoryEntry>) -> Option<&HistoryEntry> {
        self.entries = entries;
        self.entries.last()
    }
}
