//! One pretty-printed JSON file per call id.
//!
//! Saves are plain overwrites: the latest extraction for a call replaces any
//! earlier one and no history is kept.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid call id '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidCallId(String),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/call_<call_id>_output.json`. The id becomes part of a file name,
    /// so anything that could escape the directory is rejected.
    pub fn path_for(&self, call_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !call_id.is_empty()
            && call_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidCallId(call_id.to_string()));
        }
        Ok(self.dir.join(format!("call_{call_id}_output.json")))
    }

    /// Writes `output` for `call_id`, replacing any previous file, and returns its path.
    pub fn save(&self, call_id: &str, output: &Value) -> Result<PathBuf, StoreError> {
        let path = self.path_for(call_id)?;
        let serialized = serde_json::to_string_pretty(output)?;

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, serialized).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Saved output JSON for call {call_id} to {}", path.display());
        Ok(path)
    }
}
