//! # Review State
//!
//! Sidecar JSON file recording when each permission was last confirmed
//! reviewed, so the config file itself stays read-only.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

const STATE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to read review state {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Review state {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write review state {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    #[serde(default)]
    last_reviewed: BTreeMap<String, DateTime<Utc>>,
}

/// Persisted last-reviewed timestamps keyed by permission identifier
#[derive(Debug)]
pub struct ReviewState {
    path: PathBuf,
    last_reviewed: BTreeMap<String, DateTime<Utc>>,
}

impl ReviewState {
    /// Open the state file at `path`. A missing file yields an empty state.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let path = path.into();
        let last_reviewed = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let file: StateFile =
                    serde_json::from_str(&contents).map_err(|e| StateError::Corrupt {
                        path: path.clone(),
                        source: e,
                    })?;
                file.last_reviewed
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No review state at {}, starting fresh", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(StateError::Read { path, source: e }),
        };

        Ok(Self {
            path,
            last_reviewed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_reviewed(&self, identifier: &str) -> Option<DateTime<Utc>> {
        self.last_reviewed.get(identifier).copied()
    }

    /// Record a confirmed review and flush to disk.
    ///
    /// The stored timestamp never moves backwards.
    pub fn record(&mut self, identifier: &str, at: DateTime<Utc>) -> Result<(), StateError> {
        let slot = self
            .last_reviewed
            .entry(identifier.to_string())
            .or_insert(at);
        if at > *slot {
            *slot = at;
        }
        self.save()
    }

    /// Atomically rewrite the state file (temp file + rename)
    pub fn save(&self) -> Result<(), StateError> {
        let write_err = |source| StateError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let file = StateFile {
            version: STATE_VERSION,
            last_reviewed: self.last_reviewed.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}
