//! Normalized billing events.
//!
//! Provider adapters (external collaborators) verify signatures, parse the
//! provider-specific payload, and hand the core one of these. The core
//! never inspects raw provider payloads to guess shapes; everything it
//! needs is in the tagged variant and the typed fields.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{Money, Provider, UserId};

/// Canonical transition input, already normalized from the provider's
/// notification schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First (or one-off) charge completed.
    PaymentSucceeded,
    /// First (or one-off) charge failed.
    PaymentFailed,
    /// Recurring renewal charge completed.
    RenewalSucceeded,
    /// Recurring renewal charge failed.
    RenewalFailed,
    /// Charge refunded in full.
    Refunded,
    /// User asked to cancel at period end.
    UserCanceled,
    /// Billing paused at the provider.
    Paused,
    /// Billing resumed at the provider.
    Resumed,
    /// Kind the core does not understand. Accepted by the gate, reported
    /// as unprocessed by the state machine.
    Unknown(String),
}

impl EventKind {
    /// Returns the canonical name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PaymentSucceeded => "payment_succeeded",
            EventKind::PaymentFailed => "payment_failed",
            EventKind::RenewalSucceeded => "renewal_succeeded",
            EventKind::RenewalFailed => "renewal_failed",
            EventKind::Refunded => "refunded",
            EventKind::UserCanceled => "user_canceled",
            EventKind::Paused => "paused",
            EventKind::Resumed => "resumed",
            EventKind::Unknown(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deduplication key: `(provider, external event id)`.
///
/// The external id is guaranteed stable per provider across true retries,
/// which is what makes first-writer-wins admission correct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub provider: Provider,
    pub external_event_id: String,
}

impl DedupKey {
    /// Creates a key for the given provider event.
    pub fn new(provider: Provider, external_event_id: impl Into<String>) -> Self {
        Self {
            provider,
            external_event_id: external_event_id.into(),
        }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.external_event_id)
    }
}

/// A provider notification stripped of transport and signature concerns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Originating provider.
    pub provider: Provider,

    /// Provider's stable, unique event id (used for deduplication).
    pub external_event_id: String,

    /// Canonical transition input.
    pub kind: EventKind,

    /// Provider-side subscription reference this event is about.
    pub subscription_ref: String,

    /// Owning user, when the adapter can resolve one from the payload.
    pub user_id: Option<UserId>,

    /// Plan reference, when present (needed to create a subscription on
    /// first payment).
    pub plan_id: Option<String>,

    /// Charged or refunded amount, when the event is financial.
    pub amount: Option<Money>,

    /// ISO currency code, lowercase. Defaults to "usd" downstream.
    pub currency: Option<String>,

    /// Remaining provider-specific facts (platform, proration credit, ...).
    pub payload: serde_json::Value,
}

impl NormalizedEvent {
    /// Deduplication key for this event.
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(self.provider, self.external_event_id.clone())
    }

    /// Currency for ledger facts, defaulting when the adapter omitted it.
    pub fn currency_or_default(&self) -> &str {
        self.currency.as_deref().unwrap_or("usd")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind) -> NormalizedEvent {
        NormalizedEvent {
            provider: Provider::Stripe,
            external_event_id: "evt_1".to_string(),
            kind,
            subscription_ref: "sub_1".to_string(),
            user_id: None,
            plan_id: None,
            amount: None,
            currency: None,
            payload: serde_json::json!({}),
        }
    }

    #[test]
    fn dedup_key_combines_provider_and_event_id() {
        let key = event(EventKind::PaymentSucceeded).dedup_key();
        assert_eq!(format!("{}", key), "stripe:evt_1");
    }

    #[test]
    fn same_event_id_from_different_providers_has_distinct_keys() {
        let a = DedupKey::new(Provider::Stripe, "evt_1");
        let b = DedupKey::new(Provider::AppStore, "evt_1");
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_kind_preserves_original_name() {
        let kind = EventKind::Unknown("customer.discount.created".to_string());
        assert_eq!(kind.as_str(), "customer.discount.created");
    }

    #[test]
    fn currency_defaults_to_usd() {
        assert_eq!(event(EventKind::Refunded).currency_or_default(), "usd");
    }

    #[test]
    fn event_kind_serializes_snake_case() {
        let json = serde_json::to_string(&EventKind::RenewalFailed).unwrap();
        assert_eq!(json, "\"renewal_failed\"");
    }
}
