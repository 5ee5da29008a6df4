//! JSONL file store for history entries.
//!
//! Each [`HistoryEntry`] is one JSON object per line. Saving rewrites the
//! whole file; loading a missing file yields an empty history.

use conclave_domain::HistoryEntry;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Field stamped on entries that do not carry one yet
pub const SAVED_AT_KEY: &str = "saved_at";

#[derive(Error, Debug)]
pub enum HistoryStoreError {
    #[error("History I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed history entry at {path}:{line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not serialize history entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// History file with one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonlHistoryStore {
    path: PathBuf,
}

impl JsonlHistoryStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry. Blank lines are skipped; a missing file is empty.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, HistoryStoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No history file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|source| HistoryStoreError::Parse {
                path: self.path.clone(),
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }

        debug!(entries = entries.len(), "Loaded history from {}", self.path.display());
        Ok(entries)
    }

    /// Rewrite the file with `entries`, creating parent directories as needed
    pub fn save(&self, entries: &[HistoryEntry]) -> Result<(), HistoryStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        let mut writer = BufWriter::new(file);
        let saved_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        for entry in entries {
            let entry = if entry.get(SAVED_AT_KEY).is_some() {
                entry.clone()
            } else {
                entry.clone().with(SAVED_AT_KEY, saved_at.as_str())
            };
            let line = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", line).map_err(|e| self.io_error(e))?;
        }
        writer.flush().map_err(|e| self.io_error(e))?;

        debug!(entries = entries.len(), "Saved history to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> HistoryStoreError {
        warn!("History file {}: {}", self.path.display(), source);
        HistoryStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("absent.jsonl"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_keeps_fields_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("nested/history.jsonl"));

        let entries = vec![
            HistoryEntry::event("initialized").with("agents", 2),
            HistoryEntry::event("query").with("query", "tides"),
        ];
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].get("agents"), Some(&serde_json::json!(2)));
        assert_eq!(loaded[1].get("query"), Some(&serde_json::json!("tides")));
        assert!(loaded.iter().all(|e| e.get(SAVED_AT_KEY).is_some()));
    }

    #[test]
    fn test_existing_saved_at_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlHistoryStore::new(dir.path().join("history.jsonl"));
        store
            .save(&[HistoryEntry::event("note").with(SAVED_AT_KEY, "yesterday")])
            .unwrap();
        assert_eq!(
            store.load().unwrap()[0].get(SAVED_AT_KEY),
            Some(&serde_json::json!("yesterday"))
        );
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        std::fs::write(&path, "{\"event\":\"ok\"}\n\nnot json\n").unwrap();

        let err = JsonlHistoryStore::new(&path).load().unwrap_err();
        assert!(matches!(err, HistoryStoreError::Parse { line: 3, .. }));
    }
}
