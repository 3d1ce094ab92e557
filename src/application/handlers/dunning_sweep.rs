//! DunningSweepHandler - time-driven pass over past-due and expiring
//! subscriptions.

use std::sync::Arc;

use serde_json::json;

use crate::config::DunningConfig;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::domain::ledger::{LedgerEntry, LedgerEntryType};
use crate::domain::subscription::{
    cancel_for_grace_expiry, finalize_deferred_cancellation, BillingPolicy, LedgerFact,
    Subscription, SubscriptionStatus,
};
use crate::ports::{DunningNotifier, LedgerStore, SubscriptionRepository, UpdateResult};

use super::project_entitlements::ProjectEntitlementsHandler;

/// What one sweep run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DunningSweepSummary {
    /// Milestone reminders sent.
    pub reminders_sent: u32,
    /// Past-due subscriptions canceled for grace expiry.
    pub grace_cancellations: u32,
    /// Deferred cancellations finalized to a terminal state.
    pub deferred_finalized: u32,
    /// Subscriptions whose step failed (logged, sweep continued).
    pub failures: u32,
}

/// Handler for the dunning sweep, typically run daily.
///
/// Three passes share one run: milestone reminders for the past-due
/// population, grace-expiry cancellation once the window is exhausted,
/// and finalization of deferred cancellations whose paid period elapsed.
///
/// The milestone is derived from elapsed days on every run rather than
/// from a "last reminder sent" record, so running the sweep twice on the
/// same day can resend that day's reminder. Reminders are best-effort
/// notifications, so the resend is tolerated rather than tracked.
pub struct DunningSweepHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    ledger: Arc<dyn LedgerStore>,
    notifier: Arc<dyn DunningNotifier>,
    projector: Arc<ProjectEntitlementsHandler>,
    schedule: DunningConfig,
    policy: BillingPolicy,
}

impl DunningSweepHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        ledger: Arc<dyn LedgerStore>,
        notifier: Arc<dyn DunningNotifier>,
        projector: Arc<ProjectEntitlementsHandler>,
        schedule: DunningConfig,
        policy: BillingPolicy,
    ) -> Self {
        Self {
            subscriptions,
            ledger,
            notifier,
            projector,
            schedule,
            policy,
        }
    }

    /// Runs one sweep as of `now`.
    ///
    /// Per-subscription failures are logged and counted; only a failure
    /// to enumerate the populations aborts the run.
    pub async fn run(&self, now: Timestamp) -> Result<DunningSweepSummary, DomainError> {
        let mut summary = DunningSweepSummary::default();

        let past_due = self
            .subscriptions
            .find_by_status(SubscriptionStatus::PastDue)
            .await?;
        for sub in &past_due {
            if let Err(e) = self.step_past_due(sub, now, &mut summary).await {
                summary.failures += 1;
                tracing::warn!(
                    subscription_id = %sub.id,
                    error = %e,
                    "dunning step failed, continuing sweep"
                );
            }
        }

        let due = self.subscriptions.find_deferred_cancellations_due(now).await?;
        for sub in &due {
            if let Err(e) = self.finalize_deferred(sub, now).await {
                summary.failures += 1;
                tracing::warn!(
                    subscription_id = %sub.id,
                    error = %e,
                    "deferred cancellation finalization failed, continuing sweep"
                );
            } else {
                summary.deferred_finalized += 1;
            }
        }

        tracing::info!(
            past_due = past_due.len(),
            reminders = summary.reminders_sent,
            grace_cancellations = summary.grace_cancellations,
            deferred_finalized = summary.deferred_finalized,
            failures = summary.failures,
            "dunning sweep complete"
        );
        Ok(summary)
    }

    async fn step_past_due(
        &self,
        sub: &Subscription,
        now: Timestamp,
        summary: &mut DunningSweepSummary,
    ) -> Result<(), DomainError> {
        let days = match sub.days_in_grace(now, self.policy.grace_days) {
            Some(days) => days,
            None => {
                // PastDue without a grace deadline violates the aggregate
                // invariant; skip rather than guess.
                return Err(DomainError::new(
                    ErrorCode::InternalError,
                    format!("{} is past due without a grace deadline", sub.id),
                ));
            }
        };

        if let Some(milestone) = self.schedule.milestone_for(days) {
            self.send_milestone(sub, days, milestone, now).await?;
            summary.reminders_sent += 1;
        }

        if days >= self.policy.grace_days {
            let (next, facts) = cancel_for_grace_expiry(sub, now).map_err(|e| {
                DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
            })?;
            self.commit(next, facts, now).await?;
            summary.grace_cancellations += 1;
        }

        Ok(())
    }

    async fn send_milestone(
        &self,
        sub: &Subscription,
        days: i64,
        milestone: usize,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        self.notifier.send_reminder(&sub.user_id, milestone).await?;
        let retry_link = self.notifier.regenerate_retry_link(&sub.id).await?;

        let entry = LedgerEntry::new(
            now,
            LedgerEntryType::PaymentFailed,
            sub.id.as_str(),
            sub.provider,
            crate::domain::foundation::Money::zero(),
            "usd",
            Some(sub.user_id.clone()),
            json!({
                "dunning_milestone": milestone,
                "days_in_grace": days,
                "retry_link": retry_link,
            }),
        );
        self.ledger.append(entry).await?;

        tracing::info!(
            subscription_id = %sub.id,
            milestone,
            days,
            "dunning reminder sent"
        );
        Ok(())
    }

    async fn finalize_deferred(
        &self,
        sub: &Subscription,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let (next, facts) = finalize_deferred_cancellation(sub, now)
            .map_err(|e| DomainError::new(ErrorCode::InvalidStateTransition, e.to_string()))?;
        self.commit(next, facts, now).await?;
        Ok(())
    }

    /// Writes the transitioned aggregate, appends its facts, and
    /// re-projects entitlements. A version conflict means a live event
    /// won the race; the next sweep will see the fresh state.
    async fn commit(
        &self,
        next: Subscription,
        facts: Vec<LedgerFact>,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        match self.subscriptions.update(&next).await? {
            UpdateResult::Updated => {}
            UpdateResult::Conflict => {
                return Err(DomainError::new(
                    ErrorCode::ConcurrentConflict,
                    format!("{} changed under the sweep", next.id),
                ));
            }
        }

        for fact in &facts {
            let entry = LedgerEntry::new(
                now,
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

        self.projector.project(&next.user_id, now).await?;
        Ok(())
    }
}
