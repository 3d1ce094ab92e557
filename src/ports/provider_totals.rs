//! External-totals port.
//!
//! The reconciliation auditor compares the internal ledger against each
//! provider's own report of what it settled in a window. One call per
//! provider per sweep.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, Provider};
use crate::domain::ledger::TimeRange;

/// Port for the authoritative per-provider totals collaborator.
#[async_trait]
pub trait ProviderTotals: Send + Sync {
    /// Net settled amount the provider reports for the window
    /// (payments minus refunds).
    async fn provider_total(
        &self,
        provider: Provider,
        range: &TimeRange,
    ) -> Result<Money, DomainError>;
}
