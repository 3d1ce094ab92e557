//! Ledger entry - one immutable financial or lifecycle fact.
//!
//! Entries are created by the state machine, the dunning sweep, and the
//! reconciliation auditor, and are never updated or deleted. Entries for
//! the same reference id form a timestamp-ordered history.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{LedgerEntryId, Money, Provider, Timestamp, UserId};

/// Closed set of ledger fact types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerEntryType {
    #[serde(rename = "invoice.created")]
    InvoiceCreated,
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "subscription.created")]
    SubscriptionCreated,
    #[serde(rename = "subscription.renewed")]
    SubscriptionRenewed,
    #[serde(rename = "subscription.canceled")]
    SubscriptionCanceled,
    #[serde(rename = "refund.succeeded")]
    RefundSucceeded,
    #[serde(rename = "payout.paid")]
    PayoutPaid,
}

impl LedgerEntryType {
    /// Returns the dotted wire name of this fact type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::InvoiceCreated => "invoice.created",
            LedgerEntryType::PaymentSucceeded => "payment.succeeded",
            LedgerEntryType::PaymentFailed => "payment.failed",
            LedgerEntryType::SubscriptionCreated => "subscription.created",
            LedgerEntryType::SubscriptionRenewed => "subscription.renewed",
            LedgerEntryType::SubscriptionCanceled => "subscription.canceled",
            LedgerEntryType::RefundSucceeded => "refund.succeeded",
            LedgerEntryType::PayoutPaid => "payout.paid",
        }
    }
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable ledger fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,

    /// When the fact was recorded.
    pub timestamp: Timestamp,

    /// Fact type.
    pub entry_type: LedgerEntryType,

    /// Subscription, invoice, or payout id this fact refers to.
    pub reference_id: String,

    /// Provider the fact originated from.
    pub provider: Provider,

    /// Amount in integer cents. Zero for pure lifecycle facts.
    pub amount: Money,

    /// ISO currency code, lowercase.
    pub currency: String,

    /// Affected user, if known.
    pub user_id: Option<UserId>,

    /// Free-form annotations (dunning attempt number, mismatch detail, ...).
    pub meta: serde_json::Value,
}

impl LedgerEntry {
    /// Creates a new entry recorded at the given time.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: Timestamp,
        entry_type: LedgerEntryType,
        reference_id: impl Into<String>,
        provider: Provider,
        amount: Money,
        currency: impl Into<String>,
        user_id: Option<UserId>,
        meta: serde_json::Value,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            timestamp,
            entry_type,
            reference_id: reference_id.into(),
            provider,
            amount,
            currency: currency.into(),
            user_id,
            meta,
        }
    }
}

/// Half-open time window `[start, end)` for ledger aggregate queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Creates a window covering `[start, end)`.
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// The whole-day window ending at `end` and spanning `days` back.
    pub fn days_ending_at(end: Timestamp, days: i64) -> Self {
        Self {
            start: end.minus_days(days),
            end,
        }
    }

    /// Returns true if the timestamp falls inside the window.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        ts >= &self.start && ts < &self.end
    }
}
