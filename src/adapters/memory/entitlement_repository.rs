//! In-memory entitlement repository with versioned writes.
//!
//! # Security Note
//!
//! This adapter is for **testing and single-process use** and uses
//! `.expect()` on lock operations, which will panic if locks are
//! poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::entitlement::EntitlementSet;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{EntitlementRepository, UpdateResult};

/// In-memory entitlement store keyed by user id.
pub struct InMemoryEntitlementRepository {
    sets: RwLock<HashMap<UserId, EntitlementSet>>,
}

impl InMemoryEntitlementRepository {
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEntitlementRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntitlementRepository for InMemoryEntitlementRepository {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<EntitlementSet>, DomainError> {
        Ok(self
            .sets
            .read()
            .expect("InMemoryEntitlementRepository: lock poisoned")
            .get(user_id)
            .cloned())
    }

    async fn put(&self, set: &EntitlementSet) -> Result<UpdateResult, DomainError> {
        let mut sets = self
            .sets
            .write()
            .expect("InMemoryEntitlementRepository: write lock poisoned");

        match sets.get_mut(&set.user_id) {
            Some(stored) => {
                if stored.version != set.version {
                    return Ok(UpdateResult::Conflict);
                }
                *stored = set.clone();
                stored.version += 1;
            }
            None => {
                if set.version != 0 {
                    return Ok(UpdateResult::Conflict);
                }
                let mut stored = set.clone();
                stored.version = 1;
                sets.insert(stored.user_id.clone(), stored);
            }
        }
        Ok(UpdateResult::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::FeatureSet;
    use crate::domain::foundation::Timestamp;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn first_put_requires_version_zero() {
        let repo = InMemoryEntitlementRepository::new();
        let mut set = EntitlementSet::empty(user(), Timestamp::now());

        set.version = 3;
        assert_eq!(repo.put(&set).await.unwrap(), UpdateResult::Conflict);

        set.version = 0;
        assert_eq!(repo.put(&set).await.unwrap(), UpdateResult::Updated);
        assert_eq!(repo.find_by_user_id(&user()).await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn stale_put_conflicts() {
        let repo = InMemoryEntitlementRepository::new();
        let set = EntitlementSet::empty(user(), Timestamp::now());
        repo.put(&set).await.unwrap();

        let mut fresh = repo.find_by_user_id(&user()).await.unwrap().unwrap();
        fresh.features = FeatureSet::from_pairs(&[("premium", true)]);
        assert_eq!(repo.put(&fresh).await.unwrap(), UpdateResult::Updated);

        // The same copy again is now one version behind
        assert_eq!(repo.put(&fresh).await.unwrap(), UpdateResult::Conflict);
    }
}
