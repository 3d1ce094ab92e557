//! In-memory dedup store.
//!
//! Admission is a single insert under one write lock, which gives the
//! same first-writer-wins guarantee a database primary key does: of any
//! number of concurrent callers for one key, exactly one observes
//! `Admitted`.
//!
//! # Security Note
//!
//! This adapter is for **testing and single-process use** and uses
//! `.expect()` on lock operations, which will panic if locks are
//! poisoned. A deployment that needs durability backs this port with a
//! database unique constraint instead.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::subscription::DedupKey;
use crate::ports::{Admission, DedupRecord, DedupStatus, DedupStore};

/// In-memory dedup store keyed by `provider:externalEventId`.
pub struct InMemoryDedupStore {
    records: RwLock<HashMap<String, DedupRecord>>,
}

impl InMemoryDedupStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently held (for test assertions).
    pub fn len(&self) -> usize {
        self.records
            .read()
            .expect("InMemoryDedupStore: records lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryDedupStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn admit(&self, key: &DedupKey, now: Timestamp) -> Result<Admission, DomainError> {
        let mut records = self
            .records
            .write()
            .expect("InMemoryDedupStore: records write lock poisoned");

        match records.get(&key.to_string()) {
            Some(existing) => Ok(Admission::AlreadyProcessed(existing.clone())),
            None => {
                records.insert(key.to_string(), DedupRecord::admitted(key.clone(), now));
                Ok(Admission::Admitted)
            }
        }
    }

    async fn record_outcome(
        &self,
        key: &DedupKey,
        status: DedupStatus,
        reason: Option<String>,
    ) -> Result<(), DomainError> {
        let mut records = self
            .records
            .write()
            .expect("InMemoryDedupStore: records write lock poisoned");
        if let Some(record) = records.get_mut(&key.to_string()) {
            record.status = status;
            record.reason = reason;
        }
        Ok(())
    }

    async fn release(&self, key: &DedupKey) -> Result<(), DomainError> {
        self.records
            .write()
            .expect("InMemoryDedupStore: records write lock poisoned")
            .remove(&key.to_string());
        Ok(())
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut records = self
            .records
            .write()
            .expect("InMemoryDedupStore: records write lock poisoned");
        let before = records.len();
        records.retain(|_, record| !record.processed_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}
