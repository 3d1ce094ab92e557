//! In-memory adapters.
//!
//! Single-process implementations of every port, used by tests and the
//! demo binary. Each one honors the same contract a persistent adapter
//! would: atomic admission in the dedup store, versioned writes in the
//! repositories, append-only semantics in the ledger.

mod dedup_store;
mod entitlement_repository;
mod feature_catalog;
mod ledger_store;
mod notifier;
mod provider_totals;
mod subscription_repository;

pub use dedup_store::InMemoryDedupStore;
pub use entitlement_repository::InMemoryEntitlementRepository;
pub use feature_catalog::StaticFeatureCatalog;
pub use ledger_store::InMemoryLedgerStore;
pub use notifier::RecordingDunningNotifier;
pub use provider_totals::FixedProviderTotals;
pub use subscription_repository::InMemorySubscriptionRepository;
