//! Subscription aggregate entity.
//!
//! One billing relationship between a user and a provider/plan. Mutated
//! only through the pure transition functions in [`super::transition`],
//! applied by the ingest and sweep handlers under optimistic concurrency.
//!
//! # Invariants
//!
//! - `grace_until` is set if and only if status is `PastDue`
//! - `current_period_end > current_period_start`
//! - Terminal records (`Canceled`, `Ended`) accept no further
//!   lifecycle-advancing transitions
//! - Records are never physically deleted (retained for audit)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{Provider, StateMachine, SubscriptionId, Timestamp, UserId};

use super::SubscriptionStatus;

/// Subscription aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Stable identifier, provider-derived where possible.
    pub id: SubscriptionId,

    /// User who owns this subscription.
    pub user_id: UserId,

    /// Billing provider.
    pub provider: Provider,

    /// Provider plan reference.
    pub plan_id: String,

    /// Current lifecycle status.
    pub status: SubscriptionStatus,

    /// Start of current billing period.
    pub current_period_start: Timestamp,

    /// End of current billing period.
    pub current_period_end: Timestamp,

    /// End of the grace period. Present exactly while `PastDue`.
    pub grace_until: Option<Timestamp>,

    /// Deferred cancellation requested; access persists until period end.
    pub cancel_at_period_end: bool,

    /// Billing paused at the provider; entitlements suspended, record
    /// retained for resume.
    pub paused: bool,

    /// Opaque provider-specific facts (platform, proration credit, ...).
    pub provider_metadata: BTreeMap<String, String>,

    /// Optimistic concurrency version, bumped by the repository on every
    /// successful write.
    pub version: u64,

    /// When the subscription was created.
    pub created_at: Timestamp,

    /// When the subscription was last updated.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a subscription awaiting its first payment.
    pub fn new_incomplete(
        id: SubscriptionId,
        user_id: UserId,
        provider: Provider,
        plan_id: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            provider,
            plan_id: plan_id.into(),
            status: SubscriptionStatus::Incomplete,
            current_period_start: now,
            // Placeholder period; set for real when payment completes.
            current_period_end: now.add_hours(1),
            grace_until: None,
            cancel_at_period_end: false,
            paused: false,
            provider_metadata: BTreeMap::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a subscription starting in a trial period.
    pub fn new_trialing(
        id: SubscriptionId,
        user_id: UserId,
        provider: Provider,
        plan_id: impl Into<String>,
        trial_days: i64,
        now: Timestamp,
    ) -> Self {
        Self {
            status: SubscriptionStatus::Trialing,
            current_period_end: now.add_days(trial_days),
            ..Self::new_incomplete(id, user_id, provider, plan_id, now)
        }
    }

    /// Returns true if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if this subscription currently contributes to the
    /// user's entitlement set.
    ///
    /// Paused subscriptions are retained but contribute nothing.
    pub fn contributes_entitlements(&self) -> bool {
        self.status.is_entitled() && !self.paused
    }

    /// Whole days since the subscription entered its grace period.
    ///
    /// Derived from `grace_until` and the configured grace window rather
    /// than stored, since `grace_until` is always `entered + grace_days`.
    /// Returns `None` unless the subscription is in grace.
    pub fn days_in_grace(&self, now: Timestamp, grace_days: i64) -> Option<i64> {
        let grace_until = self.grace_until?;
        let entered = grace_until.minus_days(grace_days);
        Some(now.whole_days_since(&entered))
    }

    /// Checks the structural invariants hold. Used by tests and the
    /// in-memory adapters' debug assertions.
    pub fn invariants_hold(&self) -> bool {
        let grace_matches = self.grace_until.is_some() == (self.status == SubscriptionStatus::PastDue);
        let period_ordered = self.current_period_end > self.current_period_start;
        grace_matches && period_ordered
    }
}
