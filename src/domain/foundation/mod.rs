//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the billing domain.

mod errors;
mod ids;
mod money;
mod provider;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{LedgerEntryId, SubscriptionId, UserId};
pub use money::Money;
pub use provider::Provider;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
