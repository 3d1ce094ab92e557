//! Reconciliation audit configuration

use serde::Deserialize;

use super::error::ValidationError;

fn default_tolerance_cents() -> i64 {
    100
}

fn default_window_days() -> i64 {
    1
}

/// Reconciliation audit settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Absolute discrepancy (cents) at or below which no alert is raised
    #[serde(default = "default_tolerance_cents")]
    pub tolerance_cents: i64,
    /// Length of the audit window in days
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tolerance_cents: default_tolerance_cents(),
            window_days: default_window_days(),
        }
    }
}

impl ReconciliationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tolerance_cents < 0 {
            return Err(ValidationError::NegativeTolerance);
        }
        if self.window_days < 1 {
            return Err(ValidationError::InvalidReconciliationWindow);
        }
        Ok(())
    }
}
