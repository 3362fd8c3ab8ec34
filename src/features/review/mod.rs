//! # Review Feature
//!
//! Permission entries, their configuration file, and persisted review state.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Sidecar review state file
//! - 1.0.0: Initial release with JSON config loader

pub mod config;
pub mod entry;
pub mod state;

pub use config::{ConfigError, ReviewConfig, Reviewer, SmtpSettings};
pub use entry::{is_due, PermissionEntry, DEFAULT_INTERVAL_DAYS};
pub use state::{ReviewState, StateError};
