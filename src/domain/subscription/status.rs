//! Subscription status state machine.
//!
//! Defines all lifecycle states and the transitions the billing event
//! table allows between them.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created but first payment has not completed. No entitlements.
    Incomplete,

    /// Trial period. Entitled without payment.
    Trialing,

    /// Paid up. Fully entitled.
    Active,

    /// Renewal failed, inside the grace period.
    /// Entitlements are preserved while retries run.
    PastDue,

    /// Terminated before or at period end. Terminal.
    Canceled,

    /// Ran to the end of its final period. Terminal.
    Ended,
}

impl SubscriptionStatus {
    /// Returns true if this status contributes to the user's entitlements.
    ///
    /// PastDue counts: the grace period exists precisely so access is not
    /// revoked while payment retries run.
    pub fn is_entitled(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing | SubscriptionStatus::PastDue
        )
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, target),
            // From INCOMPLETE
            (Incomplete, Active)
                | (Incomplete, Canceled)
            // From TRIALING
                | (Trialing, Active)
                | (Trialing, PastDue)
                | (Trialing, Canceled)
                | (Trialing, Ended)
            // From ACTIVE
                | (Active, Active) // Renewal
                | (Active, PastDue)
                | (Active, Canceled)
                | (Active, Ended)
            // From PAST_DUE
                | (PastDue, Active)
                | (PastDue, Canceled)
                | (PastDue, Ended)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus::*;
        match self {
            Incomplete => vec![Active, Canceled],
            Trialing => vec![Active, PastDue, Canceled, Ended],
            Active => vec![Active, PastDue, Canceled, Ended],
            PastDue => vec![Active, Canceled, Ended],
            Canceled => vec![],
            Ended => vec![],
        }
    }
}
