//! IngestEventHandler - idempotent admission and application of billing
//! provider events.

use std::sync::Arc;
use thiserror::Error;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp};
use crate::domain::ledger::LedgerEntry;
use crate::domain::subscription::{
    apply_event, BillingPolicy, EventKind, LedgerFact, NormalizedEvent, Subscription,
    SubscriptionStatus, Transition, TransitionError,
};
use crate::ports::{
    Admission, DedupStatus, DedupStore, LedgerStore, SubscriptionRepository, UpdateResult,
};

use super::project_entitlements::ProjectEntitlementsHandler;

/// Bounded retries for the optimistic subscription write.
const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Command to ingest one normalized provider event.
#[derive(Debug, Clone)]
pub struct IngestEventCommand {
    /// Provider-agnostic event, already normalized by the inbound adapter.
    pub event: NormalizedEvent,
    /// Processing time, injected for testability.
    pub now: Timestamp,
}

/// Result of event ingestion.
#[derive(Debug, Clone)]
pub enum IngestOutcome {
    /// The event won admission and changed subscription state.
    Applied {
        subscription_id: SubscriptionId,
        status: SubscriptionStatus,
    },
    /// The event id was seen before; the original outcome is reproduced
    /// without re-executing any transition.
    Duplicate {
        status: DedupStatus,
        reason: Option<String>,
    },
    /// Admitted but produced no state change (unknown subscription,
    /// unhandled kind, inapplicable in the current state).
    Unprocessed { reason: String },
    /// A known lifecycle event arrived for a terminal record. Recorded
    /// as ignored so redelivery does not loop, but surfaced loudly.
    Rejected { reason: String },
}

/// Errors that abort ingestion.
///
/// Transient failures release the dedup reservation first, so provider
/// redelivery gets a clean retry.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Infrastructure failed mid-flight; safe to redeliver.
    #[error("transient ingestion failure: {0}")]
    Transient(DomainError),

    /// Non-retryable failure.
    #[error(transparent)]
    Domain(DomainError),
}

impl IngestError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Transient(_))
    }
}

/// Handler for provider event ingestion.
///
/// Pipeline: atomic dedup admission, subscription resolution, pure
/// transition, optimistic write with bounded retry, ledger append,
/// outcome recording, entitlement re-projection.
pub struct IngestEventHandler {
    dedup: Arc<dyn DedupStore>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn LedgerStore>,
    projector: Arc<ProjectEntitlementsHandler>,
    policy: BillingPolicy,
}

impl IngestEventHandler {
    pub fn new(
        dedup: Arc<dyn DedupStore>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn LedgerStore>,
        projector: Arc<ProjectEntitlementsHandler>,
        policy: BillingPolicy,
    ) -> Self {
        Self {
            dedup,
            subscriptions,
            ledger,
            projector,
            policy,
        }
    }

    pub async fn handle(&self, cmd: IngestEventCommand) -> Result<IngestOutcome, IngestError> {
        let key = cmd.event.dedup_key();

        // 1. Atomic create-if-absent admission. Exactly one concurrent
        //    delivery per key gets past this point.
        match self
            .dedup
            .admit(&key, cmd.now)
            .await
            .map_err(IngestError::Transient)?
        {
            Admission::Admitted => {}
            Admission::AlreadyProcessed(record) => {
                tracing::debug!(key = %key, status = ?record.status, "duplicate event");
                return Ok(IngestOutcome::Duplicate {
                    status: record.status,
                    reason: record.reason,
                });
            }
        }

        // From here on the key is reserved: any transient failure must
        // release it so redelivery can retry.
        match self.process_admitted(&cmd).await {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_transient() => {
                if let Err(release_err) = self.dedup.release(&key).await {
                    tracing::error!(
                        key = %key,
                        error = %release_err,
                        "failed to release dedup reservation after transient failure"
                    );
                }
                Err(IngestError::Transient(err))
            }
            Err(err) => Err(IngestError::Domain(err)),
        }
    }

    async fn process_admitted(
        &self,
        cmd: &IngestEventCommand,
    ) -> Result<IngestOutcome, DomainError> {
        let event = &cmd.event;
        let key = event.dedup_key();

        let subscription_id = match SubscriptionId::new(&event.subscription_ref) {
            Ok(id) => id,
            Err(e) => {
                return self
                    .ignore(&key, format!("invalid subscription reference: {}", e))
                    .await;
            }
        };

        // 2. Resolve the subscription; a creation event may first have to
        //    materialize the record it then applies to.
        let subscription = match self.subscriptions.find_by_id(&subscription_id).await? {
            Some(sub) => sub,
            None => match self.create_from_event(&subscription_id, event, cmd.now).await? {
                Some(sub) => sub,
                None => {
                    return self
                        .ignore(&key, format!("unknown subscription {}", subscription_id))
                        .await;
                }
            },
        };

        // 3. Pure transition under optimistic concurrency, re-reading on
        //    conflict.
        let mut current = subscription;
        for attempt in 0..MAX_UPDATE_ATTEMPTS {
            let transition = match apply_event(&current, event, cmd.now, &self.policy) {
                Ok(t) => t,
                Err(TransitionError::Terminal { id, status }) => {
                    tracing::error!(
                        subscription_id = %id,
                        status = ?status,
                        kind = %event.kind,
                        "lifecycle event for terminal subscription rejected"
                    );
                    let reason = format!("{} is terminal ({:?})", id, status);
                    self.record(&key, DedupStatus::Ignored, Some(reason.clone()))
                        .await?;
                    return Ok(IngestOutcome::Rejected { reason });
                }
                Err(TransitionError::Invalid(reason)) => {
                    self.record(&key, DedupStatus::Ignored, Some(reason.clone()))
                        .await?;
                    return Ok(IngestOutcome::Rejected { reason });
                }
            };

            let (next, facts) = match transition {
                Transition::Applied {
                    subscription,
                    facts,
                } => (subscription, facts),
                Transition::Unhandled { reason } => {
                    return self.ignore(&key, reason).await;
                }
            };

            match self.subscriptions.update(&next).await? {
                UpdateResult::Updated => {
                    self.append_facts(&next, event, &facts, cmd.now).await?;
                    self.record(&key, DedupStatus::Processed, None).await?;
                    self.projector.project(&next.user_id, cmd.now).await?;

                    tracing::info!(
                        subscription_id = %next.id,
                        kind = %event.kind,
                        status = ?next.status,
                        facts = facts.len(),
                        "event applied"
                    );
                    return Ok(IngestOutcome::Applied {
                        subscription_id: next.id,
                        status: next.status,
                    });
                }
                UpdateResult::Conflict => {
                    tracing::debug!(
                        subscription_id = %next.id,
                        attempt,
                        "concurrent subscription write, re-reading"
                    );
                    current = self
                        .subscriptions
                        .find_by_id(&subscription_id)
                        .await?
                        .ok_or_else(|| {
                            DomainError::new(
                                crate::domain::foundation::ErrorCode::SubscriptionNotFound,
                                format!("{} vanished during retry", subscription_id),
                            )
                        })?;
                }
            }
        }

        Err(DomainError::new(
            crate::domain::foundation::ErrorCode::ConcurrentConflict,
            format!("update of {} kept conflicting", subscription_id),
        ))
    }

    /// A first payment for an unknown reference materializes the
    /// subscription it completes. Any other kind has nothing to attach to.
    async fn create_from_event(
        &self,
        id: &SubscriptionId,
        event: &NormalizedEvent,
        now: Timestamp,
    ) -> Result<Option<Subscription>, DomainError> {
        if event.kind != EventKind::PaymentSucceeded {
            return Ok(None);
        }
        let user_id = match &event.user_id {
            Some(user_id) => user_id.clone(),
            None => return Ok(None),
        };
        let plan_id = event.plan_id.clone().unwrap_or_else(|| "unknown".to_string());

        let sub = Subscription::new_incomplete(id.clone(), user_id, event.provider, plan_id, now);
        if let Err(insert_err) = self.subscriptions.insert(&sub).await {
            // A concurrent delivery may have created the record between
            // our miss and this insert. Re-read and hand the stored
            // record to the apply loop; only a genuine absence is an
            // error.
            return match self.subscriptions.find_by_id(id).await? {
                Some(existing) => {
                    tracing::debug!(
                        subscription_id = %id,
                        "subscription appeared during creation, using stored record"
                    );
                    Ok(Some(existing))
                }
                None => Err(insert_err),
            };
        }

        tracing::info!(subscription_id = %sub.id, provider = %sub.provider.as_str(), "subscription created from event");
        Ok(Some(sub))
    }

    /// Stamps the transition's facts into full ledger entries and appends
    /// them.
    async fn append_facts(
        &self,
        sub: &Subscription,
        event: &NormalizedEvent,
        facts: &[LedgerFact],
        now: Timestamp,
    ) -> Result<(), DomainError> {
        for fact in facts {
            let entry = LedgerEntry::new(
                now,
                fact.entry_type,
                sub.id.as_str(),
                sub.provider,
                fact.amount,
                event.currency_or_default(),
                Some(sub.user_id.clone()),
                fact.meta.clone(),
            );
            self.ledger.append(entry).await?;
        }
        Ok(())
    }

    async fn ignore(
        &self,
        key: &crate::domain::subscription::DedupKey,
        reason: String,
    ) -> Result<IngestOutcome, DomainError> {
        tracing::warn!(key = %key, reason = %reason, "event not processed");
        self.record(key, DedupStatus::Ignored, Some(reason.clone()))
            .await?;
        Ok(IngestOutcome::Unprocessed { reason })
    }

    async fn record(
        &self,
        key: &crate::domain::subscription::DedupKey,
        status: DedupStatus,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        self.dedup.record_outcome(key, status, reason).await
    }
}
