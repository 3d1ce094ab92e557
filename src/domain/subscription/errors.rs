//! Transition error types.

use thiserror::Error;

use crate::domain::foundation::{SubscriptionId, ValidationError};

use super::SubscriptionStatus;

/// Errors raised by the pure transition functions.
#[derive(Debug, Clone, Error)]
pub enum TransitionError {
    /// A lifecycle-advancing input arrived for a terminal record.
    /// Rejected loudly, never silently applied.
    #[error("Subscription {id} is terminal ({status:?}) and accepts no further transitions")]
    Terminal {
        id: SubscriptionId,
        status: SubscriptionStatus,
    },

    /// The requested transition does not exist in the transition table.
    #[error("Invalid transition: {0}")]
    Invalid(String),
}

impl From<ValidationError> for TransitionError {
    fn from(err: ValidationError) -> Self {
        TransitionError::Invalid(err.to_string())
    }
}
