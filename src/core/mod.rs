//! # Core Module
//!
//! Process settings shared by the binary and the feature modules.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod config;

pub use config::{default_state_path, Config, DEFAULT_CONFIG_FILE};
