//! Application handlers.
//!
//! Command and sweep handlers that orchestrate domain operations through
//! the ports.

pub mod cancel_subscription;
pub mod dunning_sweep;
pub mod ingest_event;
pub mod project_entitlements;
pub mod reconciliation;

pub use cancel_subscription::{
    CancelMode, CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use dunning_sweep::{DunningSweepHandler, DunningSweepSummary};
pub use ingest_event::{IngestError, IngestEventCommand, IngestEventHandler, IngestOutcome};
pub use project_entitlements::ProjectEntitlementsHandler;
pub use reconciliation::{ReconciliationHandler, ReconciliationReport, ReconciliationRow};
