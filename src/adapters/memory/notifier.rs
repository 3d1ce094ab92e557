//! Recording dunning notifier.
//!
//! Captures reminders and retry-link requests for test assertions, with
//! an opt-in failure mode per user to exercise the sweep's
//! continue-on-failure semantics.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, UserId};
use crate::ports::DunningNotifier;

/// In-memory notifier that records every call.
pub struct RecordingDunningNotifier {
    reminders: RwLock<Vec<(UserId, usize)>>,
    retry_links: RwLock<Vec<SubscriptionId>>,
    failing_users: RwLock<HashSet<UserId>>,
}

impl RecordingDunningNotifier {
    pub fn new() -> Self {
        Self {
            reminders: RwLock::new(Vec::new()),
            retry_links: RwLock::new(Vec::new()),
            failing_users: RwLock::new(HashSet::new()),
        }
    }

    /// All reminders sent, in order (for test assertions).
    pub fn reminders(&self) -> Vec<(UserId, usize)> {
        self.reminders
            .read()
            .expect("RecordingDunningNotifier: reminders lock poisoned")
            .clone()
    }

    /// All retry links regenerated, in order (for test assertions).
    pub fn retry_links(&self) -> Vec<SubscriptionId> {
        self.retry_links
            .read()
            .expect("RecordingDunningNotifier: retry_links lock poisoned")
            .clone()
    }

    /// Makes every call for this user fail.
    pub fn fail_for(&self, user_id: &UserId) {
        self.failing_users
            .write()
            .expect("RecordingDunningNotifier: failing_users write lock poisoned")
            .insert(user_id.clone());
    }

    fn should_fail(&self, user_id: &UserId) -> bool {
        self.failing_users
            .read()
            .expect("RecordingDunningNotifier: failing_users lock poisoned")
            .contains(user_id)
    }
}

impl Default for RecordingDunningNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DunningNotifier for RecordingDunningNotifier {
    async fn send_reminder(&self, user_id: &UserId, milestone: usize) -> Result<(), DomainError> {
        if self.should_fail(user_id) {
            return Err(DomainError::new(
                ErrorCode::StoreUnavailable,
                format!("reminder delivery failed for {}", user_id),
            ));
        }
        self.reminders
            .write()
            .expect("RecordingDunningNotifier: reminders write lock poisoned")
            .push((user_id.clone(), milestone));
        Ok(())
    }

    async fn regenerate_retry_link(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<String, DomainError> {
        self.retry_links
            .write()
            .expect("RecordingDunningNotifier: retry_links write lock poisoned")
            .push(subscription_id.clone());
        Ok(format!("https://pay.example.com/retry/{}", subscription_id))
    }
}
