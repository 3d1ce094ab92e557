//! Dunning notifier port.
//!
//! Outbound reminder delivery and retry-payment link generation are
//! external collaborators. Both calls are best-effort: a failure for one
//! subscription is logged by the sweep and never aborts the sweep for
//! others.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, SubscriptionId, UserId};

/// Port for the dunning reminder/retry-link collaborator.
#[async_trait]
pub trait DunningNotifier: Send + Sync {
    /// Sends the reminder for the given milestone ordinal (0-based).
    async fn send_reminder(&self, user_id: &UserId, milestone: usize) -> Result<(), DomainError>;

    /// Regenerates a retry-payment reference for the subscription and
    /// returns its URL.
    async fn regenerate_retry_link(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<String, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dunning_notifier_is_object_safe() {
        fn _accepts_dyn(_notifier: &dyn DunningNotifier) {}
    }
}
