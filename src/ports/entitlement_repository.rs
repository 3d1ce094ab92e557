//! Entitlement repository port.
//!
//! The projector's read-union-write is serialized per user with the same
//! versioned-write discipline as subscriptions: `put` only lands when the
//! stored version matches the version read (or zero for a first write).

use async_trait::async_trait;

use crate::domain::entitlement::EntitlementSet;
use crate::domain::foundation::{DomainError, UserId};

use super::UpdateResult;

/// Port for derived entitlement persistence.
#[async_trait]
pub trait EntitlementRepository: Send + Sync {
    /// Current grant for a user. Returns `None` if never projected.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EntitlementSet>, DomainError>;

    /// Writes the grant if the stored version equals `set.version`
    /// (version 0 means "no record yet"); the store bumps the version on
    /// success.
    async fn put(&self, set: &EntitlementSet) -> Result<UpdateResult, DomainError>;
}
