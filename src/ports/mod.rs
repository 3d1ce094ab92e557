//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `DedupStore` - Atomic first-writer-wins event admission
//! - `SubscriptionRepository` - Versioned subscription persistence
//! - `EntitlementRepository` - Versioned derived-grant persistence
//! - `LedgerStore` - Append-only fact log with aggregate queries
//!
//! ## Collaborator Ports
//!
//! - `DunningNotifier` - Reminder delivery and retry-link generation
//! - `ProviderTotals` - Authoritative external settlement totals
//! - `FeatureCatalog` - Provider/platform entitlement templates

mod dedup_store;
mod entitlement_repository;
mod feature_catalog;
mod ledger_store;
mod notifier;
mod provider_totals;
mod subscription_repository;

pub use dedup_store::{Admission, DedupRecord, DedupStatus, DedupStore};
pub use entitlement_repository::EntitlementRepository;
pub use feature_catalog::FeatureCatalog;
pub use ledger_store::LedgerStore;
pub use notifier::DunningNotifier;
pub use provider_totals::ProviderTotals;
pub use subscription_repository::{SubscriptionRepository, UpdateResult};
