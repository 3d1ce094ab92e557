//! Subscription domain module.
//!
//! Owns the subscription aggregate, its status state machine, normalized
//! billing events, and the pure transition table.
//!
//! # Module Structure
//!
//! - `aggregate` - Subscription aggregate entity
//! - `status` - SubscriptionStatus state machine
//! - `event` - NormalizedEvent, EventKind, DedupKey
//! - `transition` - Pure `(state, input) -> (state, facts)` logic
//! - `errors` - TransitionError

mod aggregate;
mod errors;
mod event;
mod status;
mod transition;

pub use aggregate::Subscription;
pub use errors::TransitionError;
pub use event::{DedupKey, EventKind, NormalizedEvent};
pub use status::SubscriptionStatus;
pub use transition::{
    apply_event, cancel_for_grace_expiry, cancel_immediately, finalize_deferred_cancellation,
    BillingPolicy, LedgerFact, Transition,
};
