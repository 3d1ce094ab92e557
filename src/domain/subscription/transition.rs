//! Pure transition logic: `(subscription, input) -> (new subscription, facts)`.
//!
//! No I/O happens here. The ingest handler and the sweeps apply the
//! returned aggregate with an optimistic-concurrency write and append the
//! returned facts to the ledger; on a write conflict they re-read and call
//! back in with fresh state.

use serde_json::json;

use crate::domain::foundation::{Money, StateMachine, Timestamp};
use crate::domain::ledger::LedgerEntryType;

use super::{EventKind, NormalizedEvent, Subscription, SubscriptionStatus, TransitionError};

/// Billing policy constants the transition table depends on.
#[derive(Debug, Clone, Copy)]
pub struct BillingPolicy {
    /// Length of one billing cycle in days.
    pub cycle_days: i64,
    /// Grace window after a failed renewal, in days.
    pub grace_days: i64,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            cycle_days: 30,
            grace_days: 7,
        }
    }
}

/// A ledger fact produced by a transition, before the handler stamps it
/// with id, timestamp, provider, reference, and user.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerFact {
    pub entry_type: LedgerEntryType,
    pub amount: Money,
    pub meta: serde_json::Value,
}

impl LedgerFact {
    /// A zero-amount lifecycle fact.
    pub fn lifecycle(entry_type: LedgerEntryType) -> Self {
        Self {
            entry_type,
            amount: Money::zero(),
            meta: json!({}),
        }
    }

    /// A financial fact carrying an amount.
    pub fn financial(entry_type: LedgerEntryType, amount: Money) -> Self {
        Self {
            entry_type,
            amount,
            meta: json!({}),
        }
    }

    /// Attaches annotations.
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }
}

/// Outcome of applying an event to a subscription.
#[derive(Debug, Clone)]
pub enum Transition {
    /// The event changed the record (or recorded a fact against it).
    Applied {
        subscription: Subscription,
        facts: Vec<LedgerFact>,
    },
    /// The event does not apply in the current state. No state change,
    /// logged, not an error.
    Unhandled { reason: String },
}

/// Applies a normalized event to the subscription.
///
/// # Errors
///
/// Returns [`TransitionError::Terminal`] when a known lifecycle input
/// arrives for a terminal record (a business invariant violation that is
/// surfaced loudly, never silently applied).
pub fn apply_event(
    sub: &Subscription,
    event: &NormalizedEvent,
    now: Timestamp,
    policy: &BillingPolicy,
) -> Result<Transition, TransitionError> {
    // Unknown kinds are reported unprocessed even for terminal records.
    if let EventKind::Unknown(kind) = &event.kind {
        return Ok(Transition::Unhandled {
            reason: format!("unhandled event kind '{}'", kind),
        });
    }

    if sub.is_terminal() {
        return Err(TransitionError::Terminal {
            id: sub.id.clone(),
            status: sub.status,
        });
    }

    let amount = event.amount.unwrap_or_else(Money::zero);

    match (&event.kind, sub.status) {
        // First payment completes: subscription becomes real.
        (EventKind::PaymentSucceeded, SubscriptionStatus::Incomplete) => {
            let mut next = touched(sub, now);
            next.status = sub.status.transition_to(SubscriptionStatus::Active)?;
            next.current_period_start = now;
            next.current_period_end = now.add_days(policy.cycle_days);
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![
                    LedgerFact::financial(LedgerEntryType::PaymentSucceeded, amount),
                    LedgerFact::lifecycle(LedgerEntryType::SubscriptionCreated),
                ],
            })
        }

        // Trial converts to a paid subscription.
        (EventKind::PaymentSucceeded, SubscriptionStatus::Trialing) => {
            let mut next = touched(sub, now);
            next.status = sub.status.transition_to(SubscriptionStatus::Active)?;
            next.current_period_start = now;
            next.current_period_end = now.add_days(policy.cycle_days);
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![
                    LedgerFact::financial(LedgerEntryType::PaymentSucceeded, amount),
                    LedgerFact::lifecycle(LedgerEntryType::SubscriptionRenewed)
                        .with_meta(json!({ "trial_converted": true })),
                ],
            })
        }

        // Initial charge failed: nothing to regress, record the fact.
        (EventKind::PaymentFailed, SubscriptionStatus::Incomplete) => Ok(Transition::Applied {
            subscription: touched(sub, now),
            facts: vec![LedgerFact::financial(LedgerEntryType::PaymentFailed, amount)
                .with_meta(json!({ "initial": true }))],
        }),

        // A charge failure on a live subscription opens the grace period.
        (
            EventKind::PaymentFailed | EventKind::RenewalFailed,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing,
        ) => {
            let mut next = touched(sub, now);
            next.status = sub.status.transition_to(SubscriptionStatus::PastDue)?;
            next.grace_until = Some(now.add_days(policy.grace_days));
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![LedgerFact::financial(LedgerEntryType::PaymentFailed, amount)],
            })
        }

        // Repeat failure inside grace: fact only, the clock keeps running.
        (
            EventKind::PaymentFailed | EventKind::RenewalFailed,
            SubscriptionStatus::PastDue,
        ) => Ok(Transition::Applied {
            subscription: touched(sub, now),
            facts: vec![LedgerFact::financial(LedgerEntryType::PaymentFailed, amount)
                .with_meta(json!({ "repeat": true }))],
        }),

        // Renewal recovers the grace period or extends an active period.
        (
            EventKind::RenewalSucceeded,
            SubscriptionStatus::Active | SubscriptionStatus::PastDue,
        ) => {
            let mut next = touched(sub, now);
            next.status = sub.status.transition_to(SubscriptionStatus::Active)?;
            next.grace_until = None;
            next.current_period_start = sub.current_period_end;
            next.current_period_end = sub.current_period_end.add_days(policy.cycle_days);
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![
                    LedgerFact::financial(LedgerEntryType::PaymentSucceeded, amount),
                    LedgerFact::lifecycle(LedgerEntryType::SubscriptionRenewed),
                ],
            })
        }

        // Refund terminates immediately; entitlement revocation follows.
        (EventKind::Refunded, _) => {
            let mut next = touched(sub, now);
            next.status = sub.status.transition_to(SubscriptionStatus::Canceled)?;
            next.current_period_end = now;
            next.grace_until = None;
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![LedgerFact::financial(LedgerEntryType::RefundSucceeded, amount)],
            })
        }

        // Deferred cancellation: flag only, access persists to period end.
        (EventKind::UserCanceled, _) => {
            if sub.cancel_at_period_end {
                return Ok(Transition::Unhandled {
                    reason: "cancellation already scheduled".to_string(),
                });
            }
            let mut next = touched(sub, now);
            next.cancel_at_period_end = true;
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![LedgerFact::lifecycle(LedgerEntryType::SubscriptionCanceled)
                    .with_meta(json!({ "deferred": true }))],
            })
        }

        (EventKind::Paused, SubscriptionStatus::Active) if !sub.paused => {
            let mut next = touched(sub, now);
            next.paused = true;
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![],
            })
        }

        (EventKind::Resumed, _) if sub.paused => {
            let mut next = touched(sub, now);
            next.paused = false;
            Ok(Transition::Applied {
                subscription: next,
                facts: vec![],
            })
        }

        (kind, status) => Ok(Transition::Unhandled {
            reason: format!("{} not applicable in {:?}", kind, status),
        }),
    }
}

/// Immediate administrative cancellation.
///
/// Unlike the deferred `UserCanceled` flow this moves straight to the
/// terminal `Canceled` state and ends the period now.
pub fn cancel_immediately(
    sub: &Subscription,
    now: Timestamp,
) -> Result<(Subscription, Vec<LedgerFact>), TransitionError> {
    if sub.is_terminal() {
        return Err(TransitionError::Terminal {
            id: sub.id.clone(),
            status: sub.status,
        });
    }
    let mut next = touched(sub, now);
    next.status = sub.status.transition_to(SubscriptionStatus::Canceled)?;
    next.current_period_end = now;
    next.grace_until = None;
    Ok((
        next,
        vec![LedgerFact::lifecycle(LedgerEntryType::SubscriptionCanceled)
            .with_meta(json!({ "immediate": true }))],
    ))
}

/// Grace period exhausted: the dunning sweep drives the record to
/// `Canceled`.
pub fn cancel_for_grace_expiry(
    sub: &Subscription,
    now: Timestamp,
) -> Result<(Subscription, Vec<LedgerFact>), TransitionError> {
    if sub.status != SubscriptionStatus::PastDue {
        return Err(TransitionError::Invalid(format!(
            "grace expiry requires PastDue, got {:?}",
            sub.status
        )));
    }
    let mut next = touched(sub, now);
    next.status = sub.status.transition_to(SubscriptionStatus::Canceled)?;
    next.grace_until = None;
    Ok((
        next,
        vec![LedgerFact::lifecycle(LedgerEntryType::SubscriptionCanceled)
            .with_meta(json!({ "grace_expired": true }))],
    ))
}

/// A deferred cancellation whose period has elapsed runs out, normally to
/// terminal `Ended`. An `Incomplete` record never had a paid period to
/// run out, so it finalizes to `Canceled` instead.
pub fn finalize_deferred_cancellation(
    sub: &Subscription,
    now: Timestamp,
) -> Result<(Subscription, Vec<LedgerFact>), TransitionError> {
    if sub.is_terminal() {
        return Err(TransitionError::Terminal {
            id: sub.id.clone(),
            status: sub.status,
        });
    }
    if !sub.cancel_at_period_end || sub.current_period_end.is_after(&now) {
        return Err(TransitionError::Invalid(
            "deferred cancellation is not due".to_string(),
        ));
    }
    let target = if sub.status == SubscriptionStatus::Incomplete {
        SubscriptionStatus::Canceled
    } else {
        SubscriptionStatus::Ended
    };
    let mut next = touched(sub, now);
    next.status = sub.status.transition_to(target)?;
    next.grace_until = None;
    Ok((
        next,
        vec![LedgerFact::lifecycle(LedgerEntryType::SubscriptionCanceled)
            .with_meta(json!({ "expired": true }))],
    ))
}

fn touched(sub: &Subscription, now: Timestamp) -> Subscription {
    let mut next = sub.clone();
    next.updated_at = now;
    next
}
