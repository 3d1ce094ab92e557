//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SUBLEDGER_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use subledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Billing cycle: {} days", config.billing.cycle_days);
//! ```

mod billing;
mod dunning;
mod error;
mod reconciliation;

pub use billing::BillingConfig;
pub use dunning::DunningConfig;
pub use error::{ConfigError, ValidationError};
pub use reconciliation::ReconciliationConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every section has sensible defaults, so an empty environment yields a
/// working configuration. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Billing cycle and grace window
    #[serde(default)]
    pub billing: BillingConfig,

    /// Dunning reminder schedule
    #[serde(default)]
    pub dunning: DunningConfig,

    /// Reconciliation audit settings
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SUBLEDGER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SUBLEDGER__BILLING__GRACE_DAYS=10` -> `billing.grace_days = 10`
    /// - `SUBLEDGER__RECONCILIATION__TOLERANCE_CENTS=50` -> `reconciliation.tolerance_cents = 50`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SUBLEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid,
    /// including cross-section constraints (the dunning schedule must fit
    /// inside the billing grace window).
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.billing.validate()?;
        self.dunning.validate(self.billing.grace_days)?;
        self.reconciliation.validate()?;
        Ok(())
    }
}
