//! # Review Configuration
//!
//! JSON configuration listing the permissions under review, who reviews them,
//! how often, and how reminder emails are delivered.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Accept `principal` as a single-string alias for `principals`
//! - 1.1.0: Reviewer directory for greeting names, duplicate identifier check
//! - 1.0.0: Initial release with SMTP settings and permission list

use super::entry::{PermissionEntry, DEFAULT_INTERVAL_DAYS};
use super::state::ReviewState;
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SMTP_SERVER: &str = "localhost";
pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_SENDER_EMAIL: &str = "permission_review@example.com";
/// Daily checks unless the config says otherwise
pub const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 24 * 60;
/// Longest accepted gap between checks: one year
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 366 * 24 * 60;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in configuration file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field '{field}' in {location}")]
    MissingField {
        location: String,
        field: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// SMTP delivery settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender_email: String,
    pub sender_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_SMTP_SERVER.to_string(),
            port: DEFAULT_SMTP_PORT,
            sender_email: DEFAULT_SENDER_EMAIL.to_string(),
            sender_name: None,
            username: None,
            password: None,
            tls: false,
        }
    }
}

/// A known reviewer, used to address emails by name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reviewer {
    pub name: String,
    pub email: String,
}

/// Fully validated review configuration for one run
#[derive(Debug, Clone)]
pub struct ReviewConfig {
    pub smtp: SmtpSettings,
    pub review_form_url: Option<String>,
    pub check_interval_minutes: u64,
    pub reviewers: Vec<Reviewer>,
    /// Entries in file order
    pub permissions: Vec<PermissionEntry>,
}

impl ReviewConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let raw: RawConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Malformed {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config = raw.validate()?;
        info!(
            "Configuration loaded from {} ({} permission entries)",
            path.display(),
            config.permissions.len()
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        raw.validate()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes.saturating_mul(60))
    }

    /// Display name for a reviewer address, if listed in the directory
    pub fn reviewer_name(&self, email: &str) -> Option<&str> {
        self.reviewers
            .iter()
            .find(|r| r.email.eq_ignore_ascii_case(email))
            .map(|r| r.name.as_str())
    }

    /// Review form link for an entry: entry override first, then the config-wide link
    pub fn review_form_url_for<'a>(&'a self, entry: &'a PermissionEntry) -> Option<&'a str> {
        entry
            .review_form_url
            .as_deref()
            .or(self.review_form_url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// Merge persisted review timestamps into the entries
    pub fn apply_state(&mut self, state: &ReviewState) {
        for entry in &mut self.permissions {
            if let Some(at) = state.last_reviewed(&entry.identifier) {
                entry.mark_reviewed(at);
            }
        }
    }

    /// Override SMTP credentials, e.g. from the environment
    pub fn apply_credentials(&mut self, username: Option<String>, password: Option<String>) {
        if username.is_some() {
            self.smtp.username = username;
        }
        if password.is_some() {
            self.smtp.password = password;
        }
    }
}

fn is_email(value: &str) -> bool {
    value.parse::<lettre::Address>().is_ok()
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    smtp: RawSmtp,
    review_form_url: Option<String>,
    check_interval_minutes: Option<u64>,
    default_interval_days: Option<u32>,
    #[serde(default)]
    reviewers: Vec<Reviewer>,
    permissions: Option<Vec<RawEntry>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSmtp {
    server: Option<String>,
    port: Option<i64>,
    sender_email: Option<String>,
    sender_name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    #[serde(default)]
    tls: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    identifier: Option<String>,
    description: Option<String>,
    #[serde(default, alias = "principal")]
    principals: Option<OneOrMany>,
    granted_at: Option<DateTime<Utc>>,
    reviewer: Option<String>,
    interval_days: Option<u32>,
    last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    details: BTreeMap<String, serde_json::Value>,
    review_form_url: Option<String>,
}

impl RawConfig {
    fn validate(self) -> Result<ReviewConfig, ConfigError> {
        let smtp = self.smtp.validate()?;

        let check_interval_minutes = self
            .check_interval_minutes
            .unwrap_or(DEFAULT_CHECK_INTERVAL_MINUTES);
        if !(1..=MAX_CHECK_INTERVAL_MINUTES).contains(&check_interval_minutes) {
            return Err(ConfigError::Invalid(format!(
                "check_interval_minutes must be between 1 and {MAX_CHECK_INTERVAL_MINUTES}"
            )));
        }

        let default_interval_days = self.default_interval_days.unwrap_or(DEFAULT_INTERVAL_DAYS);
        if default_interval_days == 0 {
            return Err(ConfigError::Invalid(
                "default_interval_days must be greater than 0".to_string(),
            ));
        }

        for reviewer in &self.reviewers {
            if !is_email(&reviewer.email) {
                return Err(ConfigError::Invalid(format!(
                    "Reviewer '{}' has an invalid email address: {}",
                    reviewer.name, reviewer.email
                )));
            }
        }

        let raw_entries = self.permissions.ok_or(ConfigError::MissingField {
            location: "configuration".to_string(),
            field: "permissions",
        })?;

        let mut seen = HashSet::new();
        let mut permissions = Vec::with_capacity(raw_entries.len());
        for (index, raw) in raw_entries.into_iter().enumerate() {
            let entry = raw.validate(index, default_interval_days)?;
            if !seen.insert(entry.identifier.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate permission identifier: {}",
                    entry.identifier
                )));
            }
            permissions.push(entry);
        }

        Ok(ReviewConfig {
            smtp,
            review_form_url: self.review_form_url,
            check_interval_minutes,
            reviewers: self.reviewers,
            permissions,
        })
    }
}

impl RawSmtp {
    fn validate(self) -> Result<SmtpSettings, ConfigError> {
        let defaults = SmtpSettings::default();

        let port = match self.port {
            None => defaults.port,
            Some(p) if (1..=65535).contains(&p) => p as u16,
            Some(_) => {
                return Err(ConfigError::Invalid(
                    "smtp.port must be an integer between 1 and 65535".to_string(),
                ))
            }
        };

        let sender_email = self.sender_email.unwrap_or(defaults.sender_email);
        if !is_email(&sender_email) {
            return Err(ConfigError::Invalid(format!(
                "smtp.sender_email must be a valid email address: {sender_email}"
            )));
        }

        let server = self.server.unwrap_or(defaults.server);
        if server.trim().is_empty() {
            return Err(ConfigError::Invalid("smtp.server must not be empty".to_string()));
        }

        Ok(SmtpSettings {
            server,
            port,
            sender_email,
            sender_name: self.sender_name,
            username: self.username,
            password: self.password,
            tls: self.tls,
        })
    }
}

impl RawEntry {
    fn validate(self, index: usize, default_interval_days: u32) -> Result<PermissionEntry, ConfigError> {
        let identifier = self
            .identifier
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                location: format!("permissions[{index}]"),
                field: "identifier",
            })?;

        let reviewer = self
            .reviewer
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                location: format!("permission '{identifier}'"),
                field: "reviewer",
            })?;
        if !is_email(&reviewer) {
            return Err(ConfigError::Invalid(format!(
                "Reviewer for '{identifier}' must be a valid email address: {reviewer}"
            )));
        }

        let interval_days = self.interval_days.unwrap_or(default_interval_days);
        if interval_days == 0 {
            return Err(ConfigError::Invalid(format!(
                "interval_days for '{identifier}' must be greater than 0"
            )));
        }

        let details = self
            .details
            .into_iter()
            .map(|(k, v)| {
                let rendered = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, rendered)
            })
            .collect();

        let mut entry = PermissionEntry::new(identifier, reviewer)
            .with_interval_days(interval_days)
            .with_principals(self.principals.map(Vec::<String>::from).unwrap_or_default())
            .with_last_reviewed(self.last_reviewed_at);
        entry.description = self.description;
        entry.granted_at = self.granted_at;
        entry.details = details;
        entry.review_form_url = self.review_form_url;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL: &str = r#"{
        "smtp": {
            "server": "smtp.example.com",
            "port": 587,
            "sender_email": "reviews@example.com",
            "sender_name": "Access Reviews",
            "tls": true
        },
        "review_form_url": "https://forms.example.com/review",
        "check_interval_minutes": 60,
        "default_interval_days": 30,
        "reviewers": [{ "name": "Alice", "email": "alice@example.com" }],
        "permissions": [
            {
                "identifier": "s3:prod-bucket",
                "description": "Production bucket write access",
                "principals": ["role/deploy", "user/carol"],
                "granted_at": "2026-01-01T00:00:00Z",
                "reviewer": "alice@example.com",
                "interval_days": 90,
                "last_reviewed_at": null,
                "details": { "actions": "s3:PutObject", "max_objects": 10 }
            },
            {
                "identifier": "github:org-admin",
                "principal": "user/bob",
                "reviewer": "security@example.com"
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config = ReviewConfig::from_json_str(FULL).unwrap();
        assert_eq!(config.smtp.server, "smtp.example.com");
        assert_eq!(config.smtp.port, 587);
        assert!(config.smtp.tls);
        assert_eq!(config.check_interval(), Duration::from_secs(3600));
        assert_eq!(config.permissions.len(), 2);

        let first = &config.permissions[0];
        assert_eq!(first.identifier, "s3:prod-bucket");
        assert_eq!(first.principals, vec!["role/deploy", "user/carol"]);
        assert_eq!(first.interval_days, 90);
        assert!(first.last_reviewed_at().is_none());
        assert_eq!(first.details["actions"], "s3:PutObject");
        assert_eq!(first.details["max_objects"], "10");

        let second = &config.permissions[1];
        assert_eq!(second.principals, vec!["user/bob"]);
        assert_eq!(second.interval_days, 30); // default_interval_days
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let json = r#"{ "permissions": [ { "identifier": "db:admin", "reviewer": "dba@example.com" } ] }"#;
        let config = ReviewConfig::from_json_str(json).unwrap();
        assert_eq!(config.smtp, SmtpSettings::default());
        assert_eq!(config.check_interval_minutes, DEFAULT_CHECK_INTERVAL_MINUTES);
        assert_eq!(config.permissions[0].interval_days, DEFAULT_INTERVAL_DAYS);
        assert!(config.review_form_url.is_none());
    }

    #[test]
    fn test_missing_reviewer_is_rejected() {
        let json = r#"{ "permissions": [
            { "identifier": "ok", "reviewer": "a@example.com" },
            { "identifier": "s3:prod-bucket" }
        ] }"#;
        let err = ReviewConfig::from_json_str(json).unwrap_err();
        match err {
            ConfigError::MissingField { location, field } => {
                assert_eq!(field, "reviewer");
                assert!(location.contains("s3:prod-bucket"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        let json = r#"{ "permissions": [ { "reviewer": "a@example.com" } ] }"#;
        let err = ReviewConfig::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField { field: "identifier", .. }
        ));
    }

    #[test]
    fn test_missing_permissions_list_is_rejected() {
        let err = ReviewConfig::from_json_str(r#"{ "reviewers": [] }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField { field: "permissions", .. }
        ));
    }

    #[test]
    fn test_invalid_emails_are_rejected() {
        let bad_reviewer = r#"{ "permissions": [ { "identifier": "x", "reviewer": "not-an-email" } ] }"#;
        assert!(matches!(
            ReviewConfig::from_json_str(bad_reviewer),
            Err(ConfigError::Invalid(_))
        ));

        let bad_sender = r#"{ "smtp": { "sender_email": "nobody" }, "permissions": [] }"#;
        assert!(matches!(
            ReviewConfig::from_json_str(bad_sender),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_addresses_are_rejected_at_load() {
        for reviewer in ["alice@@example.com", "alice example@example.com", "@example.com"] {
            let json = format!(
                r#"{{ "permissions": [ {{ "identifier": "x", "principals": ["u"], "reviewer": "{reviewer}" }} ] }}"#
            );
            assert!(
                matches!(ReviewConfig::from_json_str(&json), Err(ConfigError::Invalid(_))),
                "reviewer {reviewer} should be rejected"
            );
        }

        let bad_directory = r#"{ "reviewers": [{ "name": "Eve", "email": "eve@@example.com" }], "permissions": [] }"#;
        assert!(matches!(
            ReviewConfig::from_json_str(bad_directory),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_check_interval_upper_bound() {
        let huge = r#"{ "check_interval_minutes": 18446744073709551615, "permissions": [] }"#;
        assert!(matches!(
            ReviewConfig::from_json_str(huge),
            Err(ConfigError::Invalid(_))
        ));

        let json = format!(
            r#"{{ "check_interval_minutes": {MAX_CHECK_INTERVAL_MINUTES}, "permissions": [] }}"#
        );
        let config = ReviewConfig::from_json_str(&json).unwrap();
        assert_eq!(
            config.check_interval(),
            Duration::from_secs(MAX_CHECK_INTERVAL_MINUTES * 60)
        );
    }

    #[test]
    fn test_port_out_of_range_is_rejected() {
        for port in ["0", "65536", "-25"] {
            let json = format!(r#"{{ "smtp": {{ "port": {port} }}, "permissions": [] }}"#);
            assert!(
                matches!(ReviewConfig::from_json_str(&json), Err(ConfigError::Invalid(_))),
                "port {port} should be rejected"
            );
        }
    }

    #[test]
    fn test_duplicate_identifiers_are_rejected() {
        let json = r#"{ "permissions": [
            { "identifier": "dup", "reviewer": "a@example.com" },
            { "identifier": "dup", "reviewer": "b@example.com" }
        ] }"#;
        let err = ReviewConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let json = r#"{ "permissions": [ { "identifier": "x", "reviewer": "a@example.com", "interval_days": 0 } ] }"#;
        assert!(matches!(
            ReviewConfig::from_json_str(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReviewConfig::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = ReviewConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = ReviewConfig::load(file.path()).unwrap();
        assert_eq!(config.permissions.len(), 2);
    }

    #[test]
    fn test_reviewer_name_lookup_is_case_insensitive() {
        let config = ReviewConfig::from_json_str(FULL).unwrap();
        assert_eq!(config.reviewer_name("Alice@Example.com"), Some("Alice"));
        assert_eq!(config.reviewer_name("security@example.com"), None);
    }

    #[test]
    fn test_review_form_url_override() {
        let mut config = ReviewConfig::from_json_str(FULL).unwrap();
        let mut entry = config.permissions[0].clone();
        assert_eq!(
            config.review_form_url_for(&entry),
            Some("https://forms.example.com/review")
        );

        entry.review_form_url = Some("https://forms.example.com/s3".to_string());
        assert_eq!(
            config.review_form_url_for(&entry),
            Some("https://forms.example.com/s3")
        );

        config.review_form_url = None;
        entry.review_form_url = None;
        assert_eq!(config.review_form_url_for(&entry), None);
    }

    #[test]
    fn test_apply_credentials_only_overrides_present_values() {
        let mut config = ReviewConfig::from_json_str(FULL).unwrap();
        config.smtp.username = Some("file-user".to_string());
        config.apply_credentials(None, Some("secret".to_string()));
        assert_eq!(config.smtp.username.as_deref(), Some("file-user"));
        assert_eq!(config.smtp.password.as_deref(), Some("secret"));
    }
}
