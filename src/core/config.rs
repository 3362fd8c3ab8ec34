//! Process-level settings read from the environment
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Config file used when neither `-c` nor `PERMISSION_REVIEW_CONFIG` is given
pub const DEFAULT_CONFIG_FILE: &str = "permission_review_config.json";

/// Suffix appended to the config path to locate the review state sidecar
pub const STATE_FILE_SUFFIX: &str = ".state.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub state_path: Option<PathBuf>,
    pub log_level: String,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
}

impl Config {
    /// Build settings from environment variables (after `.env` has been loaded)
    pub fn from_env() -> Result<Self> {
        let config_path = env::var("PERMISSION_REVIEW_CONFIG")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let state_path = env::var("PERMISSION_REVIEW_STATE")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            config_path,
            state_path,
            log_level,
            smtp_username: non_empty_var("SMTP_USERNAME"),
            smtp_password: non_empty_var("SMTP_PASSWORD"),
        })
    }

    /// Replace the config path, e.g. from a `-c` flag
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = path.into();
        self
    }

    /// Where review timestamps are persisted.
    ///
    /// Falls back to `<config path>.state.json` next to the config file.
    pub fn state_path(&self) -> PathBuf {
        match &self.state_path {
            Some(path) => path.clone(),
            None => default_state_path(&self.config_path),
        }
    }
}

/// Sidecar path derived from a config path
pub fn default_state_path(config_path: &Path) -> PathBuf {
    let mut name = config_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
    name.push(STATE_FILE_SUFFIX);
    config_path.with_file_name(name)
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
