//! # Notify Feature
//!
//! Renders review reminder emails and hands them to a mail transport.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Implicit TLS on port 465, STARTTLS elsewhere
//! - 1.0.0: Initial release with plain SMTP

mod smtp;
mod templates;

pub use smtp::SmtpTransport;
pub use templates::{ReviewEmail, TEST_SUBJECT_PREFIX};

use async_trait::async_trait;
use thiserror::Error;

/// Notification error for a single email
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Missing template field '{field}' for {entry}")]
    MissingField { entry: String, field: &'static str },

    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Invalid transport configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Anything that can deliver a rendered review email
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &ReviewEmail) -> Result<(), NotificationError>;
}

/// Send one sample reminder to verify the email settings.
///
/// Touches neither the schedule nor any review timestamps.
pub async fn send_test_email(
    transport: &dyn MailTransport,
    config: &crate::features::review::ReviewConfig,
    recipient: Option<&str>,
) -> Result<ReviewEmail, NotificationError> {
    let email = ReviewEmail::sample(config, recipient)?;
    transport.send(&email).await?;
    Ok(email)
}
