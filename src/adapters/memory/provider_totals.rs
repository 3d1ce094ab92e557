//! Fixed provider-totals source.
//!
//! Serves per-provider totals from a settable map, standing in for the
//! real settlement-report API of each provider.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, Money, Provider};
use crate::domain::ledger::TimeRange;
use crate::ports::ProviderTotals;

/// In-memory totals source. Providers without a set value report zero.
pub struct FixedProviderTotals {
    totals: RwLock<HashMap<Provider, Money>>,
}

impl FixedProviderTotals {
    pub fn new() -> Self {
        Self {
            totals: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the total this provider will report.
    pub fn set(&self, provider: Provider, total: Money) {
        self.totals
            .write()
            .expect("FixedProviderTotals: totals write lock poisoned")
            .insert(provider, total);
    }
}

impl Default for FixedProviderTotals {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderTotals for FixedProviderTotals {
    async fn provider_total(
        &self,
        provider: Provider,
        _range: &TimeRange,
    ) -> Result<Money, DomainError> {
        Ok(self
            .totals
            .read()
            .expect("FixedProviderTotals: totals lock poisoned")
            .get(&provider)
            .copied()
            .unwrap_or_else(Money::zero))
    }
}
