//! # Features
//!
//! - `review`: permission entries, config file, persisted review state
//! - `notify`: email rendering and delivery
//! - `reminders`: the periodic review check

pub mod notify;
pub mod reminders;
pub mod review;

pub use notify::{send_test_email, MailTransport, NotificationError, ReviewEmail, SmtpTransport};
pub use reminders::{ReviewScheduler, TickReport};
pub use review::{ConfigError, PermissionEntry, ReviewConfig, ReviewState, StateError};
