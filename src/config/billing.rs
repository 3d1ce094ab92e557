//! Billing policy configuration

use serde::Deserialize;

use crate::domain::subscription::BillingPolicy;

use super::error::ValidationError;

fn default_cycle_days() -> i64 {
    30
}

fn default_grace_days() -> i64 {
    7
}

/// Billing policy (cycle and grace lengths)
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Length of one billing cycle in days
    #[serde(default = "default_cycle_days")]
    pub cycle_days: i64,

    /// Grace window after a failed renewal, in days
    #[serde(default = "default_grace_days")]
    pub grace_days: i64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cycle_days: default_cycle_days(),
            grace_days: default_grace_days(),
        }
    }
}

impl BillingConfig {
    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cycle_days < 1 {
            return Err(ValidationError::InvalidCycleDays);
        }
        if self.grace_days < 1 {
            return Err(ValidationError::InvalidGraceDays);
        }
        Ok(())
    }

    /// The domain-level policy the transition table consumes
    pub fn policy(&self) -> BillingPolicy {
        BillingPolicy {
            cycle_days: self.cycle_days,
            grace_days: self.grace_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_thirty_day_cycle_seven_day_grace() {
        let config = BillingConfig::default();
        assert_eq!(config.cycle_days, 30);
        assert_eq!(config.grace_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_cycle_days_fails_validation() {
        let config = BillingConfig {
            cycle_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn policy_mirrors_config() {
        let config = BillingConfig {
            cycle_days: 365,
            grace_days: 14,
        };
        let policy = config.policy();
        assert_eq!(policy.cycle_days, 365);
        assert_eq!(policy.grace_days, 14);
    }
}
