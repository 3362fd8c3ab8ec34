//! # Reminders Feature
//!
//! Scheduled review reminders delivered by email.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Persist confirmed reviews to the sidecar state file
//! - 1.0.0: Initial release with fixed-interval review checks

pub mod scheduler;

pub use scheduler::{ReviewScheduler, TickReport};
