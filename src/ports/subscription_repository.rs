//! Subscription repository port.
//!
//! Per-subscription transitions must be serialized: concurrent admitted
//! events for the same subscription id must not both win a blind
//! overwrite. The contract here is optimistic concurrency — `update`
//! compares the stored version against the version the caller read and
//! reports a conflict instead of overwriting. Callers re-read, re-apply
//! the transition, and retry a bounded number of times.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};

/// Result of a versioned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    /// The stored version matched and the write landed.
    Updated,
    /// Another writer got there first; re-read and retry.
    Conflict,
}

/// Port for subscription aggregate persistence.
///
/// Subscriptions are never physically deleted; terminal records are
/// retained for audit.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a new subscription.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the id already exists
    /// - `StoreUnavailable` on persistence failure
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Writes the subscription if the stored version equals
    /// `subscription.version`; the store bumps the version on success.
    async fn update(&self, subscription: &Subscription) -> Result<UpdateResult, DomainError>;

    /// Finds a subscription by its id. Returns `None` if unknown.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// All subscriptions owned by a user (a user may hold several, from
    /// different providers).
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// All subscriptions currently in the given status. Used by the
    /// dunning sweep to find the `PastDue` population.
    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<Subscription>, DomainError>;

    /// Non-terminal subscriptions flagged `cancel_at_period_end` whose
    /// period has elapsed as of `asof`.
    async fn find_deferred_cancellations_due(
        &self,
        asof: Timestamp,
    ) -> Result<Vec<Subscription>, DomainError>;
}
