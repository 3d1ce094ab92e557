//! Ledger store port.
//!
//! Append-only: no implementation may update or delete an existing entry.
//! `append` never fails for business reasons — only for storage
//! unavailability, in which case the caller must treat the entire
//! enclosing transition as failed/retryable so financial facts are never
//! silently dropped.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, Provider};
use crate::domain::ledger::{LedgerEntry, LedgerEntryType, TimeRange};

/// Port for the append-only ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Unconditional insert.
    ///
    /// # Errors
    ///
    /// - `LedgerEntryExists` if an entry with the same id already exists
    ///   (never silently overwritten)
    /// - `StoreUnavailable` on persistence failure
    async fn append(&self, entry: LedgerEntry) -> Result<(), DomainError>;

    /// Sum of amounts for the given provider and fact types inside the
    /// window. Used by the reconciliation auditor.
    async fn sum(
        &self,
        provider: Provider,
        types: &[LedgerEntryType],
        range: &TimeRange,
    ) -> Result<Money, DomainError>;

    /// All entries for one reference id, in timestamp order.
    async fn find_by_reference(&self, reference_id: &str)
        -> Result<Vec<LedgerEntry>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn LedgerStore) {}
    }
}
