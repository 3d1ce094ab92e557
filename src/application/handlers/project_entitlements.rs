//! ProjectEntitlementsHandler - rebuilds a user's derived entitlement set.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementSet, FeatureSet};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{
    EntitlementRepository, FeatureCatalog, SubscriptionRepository, UpdateResult,
};

/// Bounded retries for the versioned entitlement write.
const MAX_PUT_ATTEMPTS: u32 = 3;

/// Handler that recomputes one user's entitlements from all of their
/// subscriptions.
///
/// The projection is a pure function of current subscription state: every
/// subscription that still grants access contributes its catalog template,
/// and per-feature flags are OR-combined across contributions. A feature
/// granted by any one live subscription stays granted no matter what
/// happens to the others.
pub struct ProjectEntitlementsHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    entitlements: Arc<dyn EntitlementRepository>,
    catalog: Arc<dyn FeatureCatalog>,
}

impl ProjectEntitlementsHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        entitlements: Arc<dyn EntitlementRepository>,
        catalog: Arc<dyn FeatureCatalog>,
    ) -> Self {
        Self {
            subscriptions,
            entitlements,
            catalog,
        }
    }

    /// Recomputes and stores the user's entitlement set.
    ///
    /// Runs after every subscription state change. Always writes a full
    /// replacement (never an in-place mutation of the stored set), under
    /// the repository's versioned-write discipline.
    pub async fn project(&self, user_id: &UserId, now: Timestamp) -> Result<EntitlementSet, DomainError> {
        for _ in 0..MAX_PUT_ATTEMPTS {
            let features = self.compute(user_id).await?;

            let mut set = match self.entitlements.find_by_user_id(user_id).await? {
                Some(existing) => existing,
                None => EntitlementSet::empty(user_id.clone(), now),
            };
            set.features = features;
            set.updated_at = now;

            match self.entitlements.put(&set).await? {
                UpdateResult::Updated => return Ok(set),
                UpdateResult::Conflict => {
                    tracing::debug!(user_id = %user_id, "entitlement write conflict, retrying");
                    continue;
                }
            }
        }

        Err(DomainError::new(
            ErrorCode::ConcurrentConflict,
            format!("entitlement projection for {} kept conflicting", user_id),
        ))
    }

    /// The union of feature templates across the user's contributing
    /// subscriptions. A user with no contributing subscriptions gets an
    /// empty set, not a missing one.
    async fn compute(&self, user_id: &UserId) -> Result<FeatureSet, DomainError> {
        let subscriptions = self.subscriptions.find_by_user_id(user_id).await?;

        let mut features = FeatureSet::new();
        for sub in subscriptions
            .iter()
            .filter(|s| s.contributes_entitlements())
        {
            let template = self
                .catalog
                .features_for(sub.provider, &sub.provider_metadata)
                .await?;
            features.union(&template);
        }
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use crate::domain::foundation::{Provider, SubscriptionId};
    use crate::domain::subscription::{Subscription, SubscriptionStatus};

    struct MockSubscriptionRepository {
        subscriptions: Mutex<Vec<Subscription>>,
    }

    impl MockSubscriptionRepository {
        fn with(subscriptions: Vec<Subscription>) -> Self {
            Self {
                subscriptions: Mutex::new(subscriptions),
            }
        }
    }

    #[async_trait]
    impl SubscriptionRepository for MockSubscriptionRepository {
        async fn insert(&self, subscription: &Subscription) -> Result<(), DomainError> {
            self.subscriptions.lock().unwrap().push(subscription.clone());
            Ok(())
        }

        async fn update(&self, subscription: &Subscription) -> Result<UpdateResult, DomainError> {
            let mut subs = self.subscriptions.lock().unwrap();
            if let Some(s) = subs.iter_mut().find(|s| s.id == subscription.id) {
                *s = subscription.clone();
            }
            Ok(UpdateResult::Updated)
        }

        async fn find_by_id(
            &self,
            id: &SubscriptionId,
        ) -> Result<Option<Subscription>, DomainError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.id == id)
                .cloned())
        }

        async fn find_by_user_id(
            &self,
            user_id: &UserId,
        ) -> Result<Vec<Subscription>, DomainError> {
            Ok(self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
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
                .lock()
                .unwrap()
                .iter()
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
                .lock()
                .unwrap()
                .iter()
                .filter(|s| {
                    !s.is_terminal()
                        && s.cancel_at_period_end
                        && !s.current_period_end.is_after(&asof)
                })
                .cloned()
                .collect())
        }
    }

    struct MockEntitlementRepository {
        sets: Mutex<Vec<EntitlementSet>>,
    }

    impl MockEntitlementRepository {
        fn new() -> Self {
            Self {
                sets: Mutex::new(Vec::new()),
            }
        }

        fn get(&self, user_id: &UserId) -> Option<EntitlementSet> {
            self.sets
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.user_id == user_id)
                .cloned()
        }
    }

    #[async_trait]
    impl EntitlementRepository for MockEntitlementRepository {
        async fn find_by_user_id(
            &self,
            user_id: &UserId,
        ) -> Result<Option<EntitlementSet>, DomainError> {
            Ok(self.get(user_id))
        }

        async fn put(&self, set: &EntitlementSet) -> Result<UpdateResult, DomainError> {
            let mut sets = self.sets.lock().unwrap();
            match sets.iter_mut().find(|s| s.user_id == set.user_id) {
                Some(existing) => {
                    if existing.version != set.version {
                        return Ok(UpdateResult::Conflict);
                    }
                    *existing = set.clone();
                    existing.version += 1;
                }
                None => {
                    if set.version != 0 {
                        return Ok(UpdateResult::Conflict);
                    }
                    let mut stored = set.clone();
                    stored.version = 1;
                    sets.push(stored);
                }
            }
            Ok(UpdateResult::Updated)
        }
    }

    struct MockFeatureCatalog;

    #[async_trait]
    impl FeatureCatalog for MockFeatureCatalog {
        async fn features_for(
            &self,
            provider: Provider,
            _metadata: &BTreeMap<String, String>,
        ) -> Result<FeatureSet, DomainError> {
            Ok(match provider {
                Provider::Stripe => {
                    FeatureSet::from_pairs(&[("premium", true), ("offline", false)])
                }
                Provider::AppStore | Provider::PlayStore => {
                    FeatureSet::from_pairs(&[("mobile", true), ("offline", true)])
                }
            })
        }
    }

    fn active_sub(id: &str, user: &UserId, provider: Provider) -> Subscription {
        let now = Timestamp::now();
        let mut sub = Subscription::new_incomplete(
            SubscriptionId::new(id).unwrap(),
            user.clone(),
            provider,
            "plan_basic",
            now,
        );
        sub.status = SubscriptionStatus::Active;
        sub.current_period_end = now.add_days(30);
        sub
    }

    fn handler(
        subs: Arc<MockSubscriptionRepository>,
        ents: Arc<MockEntitlementRepository>,
    ) -> ProjectEntitlementsHandler {
        ProjectEntitlementsHandler::new(subs, ents, Arc::new(MockFeatureCatalog))
    }

    #[tokio::test]
    async fn union_keeps_feature_granted_by_any_subscription() {
        let user = UserId::new("user-1").unwrap();
        let subs = Arc::new(MockSubscriptionRepository::with(vec![
            active_sub("sub_web", &user, Provider::Stripe),
            active_sub("sub_ios", &user, Provider::AppStore),
        ]));
        let ents = Arc::new(MockEntitlementRepository::new());

        let set = handler(subs, ents)
            .project(&user, Timestamp::now())
            .await
            .unwrap();

        assert!(set.has("premium"));
        assert!(set.has("mobile"));
        // false from one template never clears true from another
        assert!(set.has("offline"));
    }

    #[tokio::test]
    async fn terminal_subscription_contributes_nothing() {
        let user = UserId::new("user-1").unwrap();
        let mut canceled = active_sub("sub_web", &user, Provider::Stripe);
        canceled.status = SubscriptionStatus::Canceled;

        let subs = Arc::new(MockSubscriptionRepository::with(vec![
            canceled,
            active_sub("sub_ios", &user, Provider::AppStore),
        ]));
        let ents = Arc::new(MockEntitlementRepository::new());

        let set = handler(subs, ents)
            .project(&user, Timestamp::now())
            .await
            .unwrap();

        assert!(!set.has("premium"));
        assert!(set.has("mobile"));
    }

    #[tokio::test]
    async fn no_subscriptions_projects_empty_set() {
        let user = UserId::new("user-1").unwrap();
        let subs = Arc::new(MockSubscriptionRepository::with(vec![]));
        let ents = Arc::new(MockEntitlementRepository::new());

        let set = handler(subs, ents.clone())
            .project(&user, Timestamp::now())
            .await
            .unwrap();

        assert!(!set.has("premium"));
        // A record exists, it is just empty
        assert!(ents.get(&user).is_some());
    }

    #[tokio::test]
    async fn paused_subscription_contributes_nothing() {
        let user = UserId::new("user-1").unwrap();
        let mut paused = active_sub("sub_web", &user, Provider::Stripe);
        paused.paused = true;

        let subs = Arc::new(MockSubscriptionRepository::with(vec![paused]));
        let ents = Arc::new(MockEntitlementRepository::new());

        let set = handler(subs, ents)
            .project(&user, Timestamp::now())
            .await
            .unwrap();

        assert!(!set.has("premium"));
    }
}
