//! # Review Scheduler
//!
//! Periodically checks which permissions are due for review and emails their
//! reviewers, one entry at a time.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Persist confirmed reviews to the sidecar state file
//! - 1.0.0: Initial release with fixed-interval checks

use crate::features::notify::{MailTransport, ReviewEmail};
use crate::features::review::{PermissionEntry, ReviewConfig, ReviewState};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::future::Future;
use tokio::time::MissedTickBehavior;

/// Outcome of one scheduler pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Identifiers whose reminder was delivered
    pub sent: Vec<String>,
    /// Identifiers whose reminder failed, with the reason
    pub failed: Vec<(String, String)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.failed.is_empty()
    }
}

pub struct ReviewScheduler {
    config: ReviewConfig,
    state: ReviewState,
    transport: Box<dyn MailTransport>,
}

impl ReviewScheduler {
    /// Build a scheduler, folding persisted review times into the config
    pub fn new(mut config: ReviewConfig, state: ReviewState, transport: Box<dyn MailTransport>) -> Self {
        config.apply_state(&state);
        Self {
            config,
            state,
            transport,
        }
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Entries due at `now`, in config order
    pub fn due_entries(&self, now: DateTime<Utc>) -> Vec<&PermissionEntry> {
        self.config
            .permissions
            .iter()
            .filter(|entry| entry.is_due(now))
            .collect()
    }

    /// Run one pass: notify every due entry sequentially.
    ///
    /// A confirmed send records `now` as the entry's review time. A failed
    /// send leaves the entry untouched so the next pass picks it up again.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let due: Vec<usize> = self
            .config
            .permissions
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_due(now))
            .map(|(i, _)| i)
            .collect();

        debug!(
            "Review check at {now}: {} of {} entries due",
            due.len(),
            self.config.permissions.len()
        );

        let mut report = TickReport::default();
        for index in due {
            let entry = &self.config.permissions[index];
            let identifier = entry.identifier.clone();

            let email = match ReviewEmail::render(entry, &self.config) {
                Ok(email) => email,
                Err(e) => {
                    warn!("Failed to render review email for {identifier}: {e}");
                    report.failed.push((identifier, e.to_string()));
                    continue;
                }
            };

            if let Err(e) = self.transport.send(&email).await {
                warn!(
                    "Failed to send review email for {identifier} to {}: {e}",
                    email.to
                );
                report.failed.push((identifier, e.to_string()));
                continue;
            }

            self.config.permissions[index].mark_reviewed(now);
            if let Err(e) = self.state.record(&identifier, now) {
                // In-memory time still advances, so this run will not resend
                warn!("Review of {identifier} sent but not persisted: {e}");
            }
            info!("Review reminder for {identifier} sent to {}", email.to);
            report.sent.push(identifier);
        }

        if !report.is_empty() {
            info!(
                "Review check complete: {} sent, {} failed",
                report.sent.len(),
                report.failed.len()
            );
        }
        report
    }

    /// Check on the configured cadence until `shutdown` resolves.
    ///
    /// The first check runs immediately. Missed checks are not replayed;
    /// the next check catches up in a single pass.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = self.config.check_interval();
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Review scheduler started ({} entries, checking every {} minutes)",
            self.config.permissions.len(),
            self.config.check_interval_minutes
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping review scheduler");
                    break;
                }
                _ = async {
                    interval.tick().await;
                    self.tick(Utc::now()).await
                } => {}
            }
        }
    }
}
