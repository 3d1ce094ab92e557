//! Application layer - Commands, Handlers, and Sweeps.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Live event ingestion and the time-driven sweeps both go through the
//! same per-subscription optimistic-concurrency discipline.

pub mod handlers;

pub use handlers::{
    CancelMode, CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
    DunningSweepHandler, DunningSweepSummary, IngestError, IngestEventCommand, IngestEventHandler,
    IngestOutcome, ProjectEntitlementsHandler, ReconciliationHandler, ReconciliationReport,
    ReconciliationRow,
};
