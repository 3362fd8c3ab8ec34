//! Email templates for review reminders.

use super::NotificationError;
use crate::features::review::{PermissionEntry, ReviewConfig};
use chrono::{DateTime, Utc};

pub const TEST_SUBJECT_PREFIX: &str = "[TEST] ";

const SIGNATURE: &str = "The Permission Review System";

/// A rendered reminder, ready to hand to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ReviewEmail {
    /// Render the reminder for one permission entry
    pub fn render(entry: &PermissionEntry, config: &ReviewConfig) -> Result<Self, NotificationError> {
        let missing = |field: &'static str| NotificationError::MissingField {
            entry: entry.identifier.clone(),
            field,
        };

        if entry.principals.is_empty() {
            return Err(missing("principals"));
        }
        let form_url = config
            .review_form_url_for(entry)
            .ok_or_else(|| missing("review_form_url"))?;

        let greeting = config.reviewer_name(&entry.reviewer).unwrap_or(&entry.reviewer);

        Ok(Self {
            to: entry.reviewer.clone(),
            subject: format!("Permission Review Required: {}", entry.display_name()),
            body: Self::text_template(entry, greeting, form_url),
        })
    }

    /// Render a sample reminder for test mode.
    ///
    /// Uses the first configured entry, or a synthetic one when the config
    /// lists none. Addressed to `recipient`, defaulting to the sender.
    pub fn sample(config: &ReviewConfig, recipient: Option<&str>) -> Result<Self, NotificationError> {
        let entry = match config.permissions.first() {
            Some(entry) => entry.clone(),
            None => synthetic_entry(&config.smtp.sender_email),
        };

        let mut email = Self::render(&entry, config)?;
        email.to = recipient
            .map(str::to_string)
            .unwrap_or_else(|| config.smtp.sender_email.clone());
        email.subject = format!("{TEST_SUBJECT_PREFIX}{}", email.subject);
        email.body = format!(
            "This is a test message from the permission review tool.\n\
             It verifies the email settings; no review is being requested.\n\n{}",
            email.body
        );
        Ok(email)
    }

    fn text_template(entry: &PermissionEntry, greeting: &str, form_url: &str) -> String {
        let mut lines = vec![
            format!("Dear {greeting},"),
            String::new(),
            "A review is required for the following permission:".to_string(),
            String::new(),
            format!("Permission:    {}", entry.identifier),
        ];
        if let Some(description) = &entry.description {
            lines.push(format!("Description:   {description}"));
        }
        lines.push(format!("Principals:    {}", entry.principals.join(", ")));
        lines.push(format!(
            "Granted:       {}",
            format_date(entry.granted_at, "not recorded")
        ));
        lines.push(format!(
            "Last review:   {}",
            format_date(entry.last_reviewed_at(), "never")
        ));
        lines.push(format!("Review every:  {} days", entry.interval_days));

        if !entry.details.is_empty() {
            lines.push("Details:".to_string());
            lines.extend(
                entry
                    .details
                    .iter()
                    .map(|(key, value)| format!("  - {key}: {value}")),
            );
        }

        lines.push(String::new());
        lines.push("Please review this permission and confirm it is still appropriate:".to_string());
        lines.push(form_url.to_string());
        lines.push(String::new());
        lines.push("Thank you,".to_string());
        lines.push(SIGNATURE.to_string());
        lines.join("\n")
    }
}

fn format_date(at: Option<DateTime<Utc>>, fallback: &str) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn synthetic_entry(reviewer: &str) -> PermissionEntry {
    let mut entry = PermissionEntry::new("example:permission", reviewer)
        .with_principals(["user/example"]);
    entry.description = Some("Sample permission".to_string());
    entry
}
