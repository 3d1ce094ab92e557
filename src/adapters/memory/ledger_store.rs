//! In-memory append-only ledger.
//!
//! # Security Note
//!
//! This adapter is for **testing and single-process use** and uses
//! `.expect()` on lock operations, which will panic if locks are
//! poisoned.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Money, Provider};
use crate::domain::ledger::{LedgerEntry, LedgerEntryType, TimeRange};
use crate::ports::LedgerStore;

/// In-memory ledger. Entries are only ever pushed; nothing here can
/// update or remove one.
pub struct InMemoryLedgerStore {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// All entries in append order (for test assertions).
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries
            .read()
            .expect("InMemoryLedgerStore: entries lock poisoned")
            .clone()
    }

    /// Number of entries (for test assertions).
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("InMemoryLedgerStore: entries lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> Result<(), DomainError> {
        let mut entries = self
            .entries
            .write()
            .expect("InMemoryLedgerStore: entries write lock poisoned");
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(DomainError::new(
                ErrorCode::LedgerEntryExists,
                format!("ledger entry {} already exists", entry.id),
            ));
        }
        entries.push(entry);
        Ok(())
    }

    async fn sum(
        &self,
        provider: Provider,
        types: &[LedgerEntryType],
        range: &TimeRange,
    ) -> Result<Money, DomainError> {
        let entries = self
            .entries
            .read()
            .expect("InMemoryLedgerStore: entries lock poisoned");
        let total = entries
            .iter()
            .filter(|e| {
                e.provider == provider
                    && types.contains(&e.entry_type)
                    && range.contains(&e.timestamp)
            })
            .fold(Money::zero(), |acc, e| acc + e.amount);
        Ok(total)
    }

    async fn find_by_reference(
        &self,
        reference_id: &str,
    ) -> Result<Vec<LedgerEntry>, DomainError> {
        let entries = self
            .entries
            .read()
            .expect("InMemoryLedgerStore: entries lock poisoned");
        let mut found: Vec<LedgerEntry> = entries
            .iter()
            .filter(|e| e.reference_id == reference_id)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.timestamp);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Timestamp, UserId};
    use serde_json::json;

    fn entry(
        ts: Timestamp,
        entry_type: LedgerEntryType,
        provider: Provider,
        cents: i64,
    ) -> LedgerEntry {
        LedgerEntry::new(
            ts,
            entry_type,
            "sub_1",
            provider,
            Money::from_cents(cents),
            "usd",
            Some(UserId::new("user-1").unwrap()),
            json!({}),
        )
    }

    #[tokio::test]
    async fn duplicate_entry_id_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let e = entry(
            Timestamp::now(),
            LedgerEntryType::PaymentSucceeded,
            Provider::Stripe,
            1000,
        );

        store.append(e.clone()).await.unwrap();
        let err = store.append(e).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LedgerEntryExists);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn sum_filters_by_provider_type_and_window() {
        let store = InMemoryLedgerStore::new();
        let now = Timestamp::now();

        store
            .append(entry(now, LedgerEntryType::PaymentSucceeded, Provider::Stripe, 1000))
            .await
            .unwrap();
        store
            .append(entry(now, LedgerEntryType::PaymentSucceeded, Provider::AppStore, 500))
            .await
            .unwrap();
        store
            .append(entry(now, LedgerEntryType::RefundSucceeded, Provider::Stripe, 200))
            .await
            .unwrap();
        // Outside the window
        store
            .append(entry(
                now.minus_days(5),
                LedgerEntryType::PaymentSucceeded,
                Provider::Stripe,
                9999,
            ))
            .await
            .unwrap();

        let window = TimeRange::days_ending_at(now.add_hours(1), 1);
        let total = store
            .sum(Provider::Stripe, &[LedgerEntryType::PaymentSucceeded], &window)
            .await
            .unwrap();
        assert_eq!(total, Money::from_cents(1000));
    }

    #[tokio::test]
    async fn find_by_reference_is_timestamp_ordered() {
        let store = InMemoryLedgerStore::new();
        let now = Timestamp::now();

        store
            .append(entry(now, LedgerEntryType::SubscriptionRenewed, Provider::Stripe, 0))
            .await
            .unwrap();
        store
            .append(entry(
                now.minus_days(1),
                LedgerEntryType::SubscriptionCreated,
                Provider::Stripe,
                0,
            ))
            .await
            .unwrap();

        let history = store.find_by_reference("sub_1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].entry_type, LedgerEntryType::SubscriptionCreated);
        assert_eq!(history[1].entry_type, LedgerEntryType::SubscriptionRenewed);
    }
}
