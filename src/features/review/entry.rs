//! # Permission Entries
//!
//! A single permission (or permission group) under periodic human review,
//! and the due check that drives the scheduler.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Free-form details map and per-entry review form override
//! - 1.0.0: Initial release with due check

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Review interval applied when neither the entry nor the config sets one
pub const DEFAULT_INTERVAL_DAYS: u32 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct PermissionEntry {
    /// Unique name or path of the permission, e.g. `s3:prod-bucket`
    pub identifier: String,
    pub description: Option<String>,
    /// Users, roles or service accounts holding the grant
    pub principals: Vec<String>,
    pub granted_at: Option<DateTime<Utc>>,
    /// Email address of the assigned reviewer
    pub reviewer: String,
    pub interval_days: u32,
    last_reviewed_at: Option<DateTime<Utc>>,
    pub details: BTreeMap<String, String>,
    /// Overrides the config-wide review form link for this entry
    pub review_form_url: Option<String>,
}

impl PermissionEntry {
    pub fn new(identifier: impl Into<String>, reviewer: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            description: None,
            principals: Vec::new(),
            granted_at: None,
            reviewer: reviewer.into(),
            interval_days: DEFAULT_INTERVAL_DAYS,
            last_reviewed_at: None,
            details: BTreeMap::new(),
            review_form_url: None,
        }
    }

    pub fn with_interval_days(mut self, days: u32) -> Self {
        self.interval_days = days;
        self
    }

    pub fn with_principals<I, S>(mut self, principals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.principals = principals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_last_reviewed(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_reviewed_at = at;
        self
    }

    pub fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    pub fn interval(&self) -> Duration {
        Duration::days(i64::from(self.interval_days))
    }

    /// Label used in subjects and logs: the description when present
    pub fn display_name(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.identifier)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        is_due(self.last_reviewed_at, self.interval(), now)
    }

    /// Record a confirmed review. Never moves the timestamp backwards.
    pub fn mark_reviewed(&mut self, at: DateTime<Utc>) {
        self.last_reviewed_at = Some(match self.last_reviewed_at {
            Some(current) if current > at => current,
            _ => at,
        });
    }
}

/// Whether a review is due: never reviewed, or `now - last >= interval`.
///
/// A last review in the future (clock skew) counts as not due.
pub fn is_due(last_reviewed: Option<DateTime<Utc>>, interval: Duration, now: DateTime<Utc>) -> bool {
    match last_reviewed {
        None => true,
        Some(last) => now.signed_duration_since(last) >= interval,
    }
}
