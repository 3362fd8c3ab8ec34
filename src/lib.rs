// Core layer - environment settings
pub mod core;

// Features layer - review config, notifications, scheduler
pub mod features;

pub use crate::core::Config;

pub use features::{
    // Notify
    send_test_email, MailTransport, NotificationError, ReviewEmail, SmtpTransport,
    // Reminders
    ReviewScheduler, TickReport,
    // Review
    ConfigError, PermissionEntry, ReviewConfig, ReviewState, StateError,
};
