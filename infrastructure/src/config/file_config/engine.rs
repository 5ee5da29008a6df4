//! Engine configuration from TOML (`[engine]` section)

use conclave_application::EngineParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw engine configuration from TOML
///
/// # Example
///
/// ```toml
/// [engine]
/// context_sync_interval_secs = 30   # 0 disables the periodic sync loop
/// history_file = "~/.local/share/conclave/history.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Seconds between context pushes to context-aware agents
    pub context_sync_interval_secs: u64,
    /// JSONL file the history is loaded from at start and saved to at exit
    pub history_file: Option<String>,
}

impl FileEngineConfig {
    /// History path with a leading `~/` expanded to the home directory
    pub fn history_path(&self) -> Option<PathBuf> {
        let raw = self.history_file.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }

    /// Engine parameters; sampling is filled in from `[generation]`
    pub fn to_engine_params(&self) -> EngineParams {
        EngineParams::default().with_context_sync_secs(self.context_sync_interval_secs)
    }
}
