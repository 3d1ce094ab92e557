//! CancelSubscriptionHandler - user- or operator-initiated cancellation.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp};
use crate::domain::ledger::LedgerEntry;
use crate::domain::subscription::{
    cancel_immediately, LedgerFact, Subscription, SubscriptionStatus, TransitionError,
};
use crate::ports::{LedgerStore, SubscriptionRepository, UpdateResult};

use super::project_entitlements::ProjectEntitlementsHandler;

const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// How the cancellation takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelMode {
    /// Flag the record; access persists until the paid period ends, then
    /// a sweep finalizes it to `Ended`.
    AtPeriodEnd,
    /// Terminal `Canceled` now; entitlements are revoked immediately.
    Immediate,
}

/// Command to cancel a subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub mode: CancelMode,
    pub now: Timestamp,
}

/// Result of a cancellation request.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    pub subscription_id: SubscriptionId,
    pub status: SubscriptionStatus,
    pub cancel_at_period_end: bool,
}

/// Handler for direct cancellation requests (as opposed to provider
/// `user_canceled` events, which flow through ingestion).
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn LedgerStore>,
    projector: Arc<ProjectEntitlementsHandler>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn LedgerStore>,
        projector: Arc<ProjectEntitlementsHandler>,
    ) -> Self {
        Self {
            subscriptions,
            ledger,
            projector,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, DomainError> {
        let mut current = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriptionNotFound,
                    format!("subscription {} not found", cmd.subscription_id),
                )
            })?;

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let (next, facts) = self.apply(&current, cmd.mode, cmd.now)?;

            match self.subscriptions.update(&next).await? {
                UpdateResult::Updated => {
                    for fact in &facts {
                        let entry = LedgerEntry::new(
                            cmd.now,
                            fact.entry_type,
                            next.id.as_str(),
                            next.provider,
                            fact.amount,
                            "usd",
                            Some(next.user_id.clone()),
                            fact.meta.clone(),
                        );
                        self.ledger.append(entry).await?;
                    }
                    self.projector.project(&next.user_id, cmd.now).await?;

                    tracing::info!(
                        subscription_id = %next.id,
                        mode = ?cmd.mode,
                        status = ?next.status,
                        "subscription canceled"
                    );
                    return Ok(CancelSubscriptionResult {
                        subscription_id: next.id,
                        status: next.status,
                        cancel_at_period_end: next.cancel_at_period_end,
                    });
                }
                UpdateResult::Conflict => {
                    current = self
                        .subscriptions
                        .find_by_id(&cmd.subscription_id)
                        .await?
                        .ok_or_else(|| {
                            DomainError::new(
                                ErrorCode::SubscriptionNotFound,
                                format!("{} vanished during retry", cmd.subscription_id),
                            )
                        })?;
                }
            }
        }

        Err(DomainError::new(
            ErrorCode::ConcurrentConflict,
            format!("update of {} kept conflicting", cmd.subscription_id),
        ))
    }

    fn apply(
        &self,
        sub: &Subscription,
        mode: CancelMode,
        now: Timestamp,
    ) -> Result<(Subscription, Vec<LedgerFact>), DomainError> {
        match mode {
            CancelMode::Immediate => cancel_immediately(sub, now).map_err(to_domain),
            CancelMode::AtPeriodEnd => {
                if sub.is_terminal() {
                    return Err(DomainError::new(
                        ErrorCode::TerminalSubscription,
                        format!("subscription {} is terminal", sub.id),
                    ));
                }
                if sub.cancel_at_period_end {
                    // Idempotent: flag is already set, nothing to write twice
                    return Ok((sub.clone(), vec![]));
                }
                let mut next = sub.clone();
                next.cancel_at_period_end = true;
                next.updated_at = now;
                Ok((
                    next,
                    vec![LedgerFact::lifecycle(
                        crate::domain::ledger::LedgerEntryType::SubscriptionCanceled,
                    )
                    .with_meta(serde_json::json!({ "deferred": true }))],
                ))
            }
        }
    }
}

fn to_domain(err: TransitionError) -> DomainError {
    match err {
        TransitionError::Terminal { id, status } => DomainError::new(
            ErrorCode::TerminalSubscription,
            format!("subscription {} is terminal ({:?})", id, status),
        ),
        TransitionError::Invalid(reason) => {
            DomainError::new(ErrorCode::InvalidStateTransition, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::adapters::memory::{
        InMemoryEntitlementRepository, InMemoryLedgerStore, InMemorySubscriptionRepository,
        StaticFeatureCatalog,
    };
    use crate::domain::foundation::{Provider, UserId};
    use crate::ports::EntitlementRepository;

    fn handler(
        subscriptions: Arc<InMemorySubscriptionRepository>,
        entitlements: Arc<InMemoryEntitlementRepository>,
    ) -> CancelSubscriptionHandler {
        let projector = Arc::new(ProjectEntitlementsHandler::new(
            subscriptions.clone(),
            entitlements,
            Arc::new(StaticFeatureCatalog::new()),
        ));
        CancelSubscriptionHandler::new(subscriptions, Arc::new(InMemoryLedgerStore::new()), projector)
    }

    async fn seed_active(repo: &InMemorySubscriptionRepository) -> SubscriptionId {
        let now = Timestamp::now();
        let mut sub = Subscription::new_incomplete(
            SubscriptionId::new("sub_1").unwrap(),
            UserId::new("user-1").unwrap(),
            Provider::Stripe,
            "plan_basic",
            now,
        );
        sub.status = SubscriptionStatus::Active;
        sub.current_period_end = now.add_days(30);
        repo.insert(&sub).await.unwrap();
        sub.id
    }

    #[tokio::test]
    async fn immediate_cancel_is_terminal_and_revokes() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let entitlements = Arc::new(InMemoryEntitlementRepository::new());
        let id = seed_active(&subscriptions).await;

        let result = handler(subscriptions.clone(), entitlements.clone())
            .handle(CancelSubscriptionCommand {
                subscription_id: id.clone(),
                mode: CancelMode::Immediate,
                now: Timestamp::now(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, SubscriptionStatus::Canceled);

        let user = UserId::new("user-1").unwrap();
        let set = entitlements.find_by_user_id(&user).await.unwrap().unwrap();
        assert!(!set.has("premium"));
    }

    #[tokio::test]
    async fn deferred_cancel_keeps_access_until_period_end() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let entitlements = Arc::new(InMemoryEntitlementRepository::new());
        let id = seed_active(&subscriptions).await;

        let result = handler(subscriptions.clone(), entitlements.clone())
            .handle(CancelSubscriptionCommand {
                subscription_id: id.clone(),
                mode: CancelMode::AtPeriodEnd,
                now: Timestamp::now(),
            })
            .await
            .unwrap();

        assert_eq!(result.status, SubscriptionStatus::Active);
        assert!(result.cancel_at_period_end);

        let user = UserId::new("user-1").unwrap();
        let set = entitlements.find_by_user_id(&user).await.unwrap().unwrap();
        assert!(set.has("premium"));
    }

    #[tokio::test]
    async fn deferred_cancel_twice_is_idempotent() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let entitlements = Arc::new(InMemoryEntitlementRepository::new());
        let id = seed_active(&subscriptions).await;
        let h = handler(subscriptions.clone(), entitlements);

        for _ in 0..2 {
            let result = h
                .handle(CancelSubscriptionCommand {
                    subscription_id: id.clone(),
                    mode: CancelMode::AtPeriodEnd,
                    now: Timestamp::now(),
                })
                .await
                .unwrap();
            assert!(result.cancel_at_period_end);
        }
    }

    #[tokio::test]
    async fn cancel_unknown_subscription_fails() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let entitlements = Arc::new(InMemoryEntitlementRepository::new());

        let err = handler(subscriptions, entitlements)
            .handle(CancelSubscriptionCommand {
                subscription_id: SubscriptionId::new("missing").unwrap(),
                mode: CancelMode::Immediate,
                now: Timestamp::now(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::SubscriptionNotFound);
    }

    #[tokio::test]
    async fn immediate_cancel_of_terminal_subscription_fails() {
        let subscriptions = Arc::new(InMemorySubscriptionRepository::new());
        let entitlements = Arc::new(InMemoryEntitlementRepository::new());
        let id = seed_active(&subscriptions).await;
        let h = handler(subscriptions, entitlements);

        h.handle(CancelSubscriptionCommand {
            subscription_id: id.clone(),
            mode: CancelMode::Immediate,
            now: Timestamp::now(),
        })
        .await
        .unwrap();

        let err = h
            .handle(CancelSubscriptionCommand {
                subscription_id: id,
                mode: CancelMode::Immediate,
                now: Timestamp::now(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::TerminalSubscription);
    }
}
