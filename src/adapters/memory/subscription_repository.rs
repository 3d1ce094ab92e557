//! In-memory subscription repository with optimistic concurrency.
//!
//! # Security Note
//!
//! This adapter is for **testing and single-process use** and uses
//! `.expect()` on lock operations, which will panic if locks are
//! poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::{SubscriptionRepository, UpdateResult};

/// In-memory subscription store keyed by id.
///
/// `update` compares the stored version against the caller's copy and
/// bumps it on success, giving the same lost-update protection a
/// `WHERE version = $n` database update does.
pub struct InMemorySubscriptionRepository {
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored subscriptions (for test assertions).
    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .expect("InMemorySubscriptionRepository: lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySubscriptionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subs = self
            .subscriptions
            .write()
            .expect("InMemorySubscriptionRepository: write lock poisoned");
        if subs.contains_key(&subscription.id) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("subscription {} already exists", subscription.id),
            ));
        }
        debug_assert!(subscription.invariants_hold());
        subs.insert(subscription.id.clone(), subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<UpdateResult, DomainError> {
        let mut subs = self
            .subscriptions
            .write()
            .expect("InMemorySubscriptionRepository: write lock poisoned");
        let stored = subs.get_mut(&subscription.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SubscriptionNotFound,
                format!("subscription {} not found", subscription.id),
            )
        })?;

        if stored.version != subscription.version {
            return Ok(UpdateResult::Conflict);
        }

        debug_assert!(subscription.invariants_hold());
        *stored = subscription.clone();
        stored.version += 1;
        Ok(UpdateResult::Updated)
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionRepository: lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionRepository: lock poisoned")
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_status(
        &self,
        status: SubscriptionStatus,
    ) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionRepository: lock poisoned")
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    async fn find_deferred_cancellations_due(
        &self,
        asof: Timestamp,
    ) -> Result<Vec<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .read()
            .expect("InMemorySubscriptionRepository: lock poisoned")
            .values()
            .filter(|s| {
                !s.is_terminal() && s.cancel_at_period_end && !s.current_period_end.is_after(&asof)
            })
            .cloned()
            .collect())
    }
}
