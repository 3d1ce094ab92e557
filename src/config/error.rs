//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Billing cycle must be at least one day")]
    InvalidCycleDays,

    #[error("Grace window must be at least one day")]
    InvalidGraceDays,

    #[error("Dunning reminder schedule cannot be empty")]
    EmptyReminderSchedule,

    #[error("Dunning reminder schedule must be strictly ascending")]
    UnorderedReminderSchedule,

    #[error("Dunning reminder schedule extends past the grace window")]
    ReminderSchedulePastGrace,

    #[error("Reconciliation tolerance cannot be negative")]
    NegativeTolerance,

    #[error("Reconciliation window must be at least one day")]
    InvalidReconciliationWindow,
}
