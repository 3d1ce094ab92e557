//! DedupStore port - the Event Gate's persistence.
//!
//! Admission converts "maybe many deliveries" into "exactly one admitted
//! processing" per distinct external event id. Implementations MUST back
//! `admit` with a single atomic create-if-absent operation (database
//! PRIMARY KEY / unique constraint) — a check followed by a later create
//! is a race and is insufficient under concurrent delivery.
//!
//! Failure mode: if the store is unavailable, admission fails closed; the
//! caller reports a transient error and the external notifier redelivers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::subscription::DedupKey;

/// Recorded outcome of a processed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStatus {
    /// The event was applied to a subscription.
    Processed,
    /// The event was acknowledged but produced no state change
    /// (unknown reference, unhandled kind, invariant rejection).
    Ignored,
}

/// Marks an event as seen. First writer wins; retained indefinitely
/// (expiry is storage hygiene, not correctness).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupRecord {
    /// `provider:externalEventId`.
    pub key: DedupKey,

    /// Recorded processing outcome.
    pub status: DedupStatus,

    /// Why the event was ignored, when it was.
    pub reason: Option<String>,

    /// When the event was admitted.
    pub processed_at: Timestamp,
}

impl DedupRecord {
    /// Fresh record at admission time. The outcome is refined once
    /// processing completes.
    pub fn admitted(key: DedupKey, now: Timestamp) -> Self {
        Self {
            key,
            status: DedupStatus::Processed,
            reason: None,
            processed_at: now,
        }
    }
}

/// Result of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// This caller won the atomic insert and proceeds to produce side
    /// effects. Every other concurrent caller for the same key loses.
    Admitted,
    /// The event was seen before; the prior record reproduces the
    /// original response without re-executing state machine logic.
    AlreadyProcessed(DedupRecord),
}

/// Port for the Event Gate's dedup records.
#[async_trait]
pub trait DedupStore: Send + Sync {
    /// Atomically create-if-absent a record for the key.
    ///
    /// Exactly one concurrent caller per key observes `Admitted`.
    async fn admit(&self, key: &DedupKey, now: Timestamp) -> Result<Admission, DomainError>;

    /// Records the final outcome for an admitted key.
    async fn record_outcome(
        &self,
        key: &DedupKey,
        status: DedupStatus,
        reason: Option<String>,
    ) -> Result<(), DomainError>;

    /// Removes the reservation for an admitted key whose processing
    /// failed transiently, so provider redelivery can retry.
    async fn release(&self, key: &DedupKey) -> Result<(), DomainError>;

    /// Deletes records older than the cutoff. Returns the number removed.
    /// Retention policy only; correctness never requires expiry.
    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
