//! Whole-log JSON persistence.
//!
//! [`JsonLogFile`] stands in for per-browser local storage: the entire log
//! is read and written as one JSON array, with no schema versioning. A
//! missing or unreadable file loads as an empty log. Loading is a one-off
//! blocking read when a session opens; saves go through `tokio::fs`.

use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// File name of the persisted image/copy job history.
pub const JOB_HISTORY_FILE: &str = "studio_history_v1.json";

/// File name of the persisted Q&A conversations.
pub const CONVERSATIONS_FILE: &str = "qa_conversations_v1.json";

/// A JSON array of `T` on disk.
#[derive(Debug, Clone)]
pub struct JsonLogFile<T> {
    path: PathBuf,
    _entry: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonLogFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole log. Any failure yields an empty log.
    pub fn load(&self) -> Vec<T> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable log");
                Vec::new()
            }
        }
    }

    /// Read the whole log, surfacing errors. A missing file is an empty log.
    pub fn try_load(&self) -> Result<Vec<T>, StoreError> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Overwrite the file with `entries`, creating parent directories.
    pub async fn save(&self, entries: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Errors from reading or writing a log file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed log: {0}")]
    Serde(#[from] serde_json::Error),
}
