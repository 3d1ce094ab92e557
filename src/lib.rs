//! Subledger - Subscription Billing Lifecycle Core
//!
//! This crate implements idempotent billing event ingestion, the
//! subscription lifecycle state machine, entitlement projection, an
//! append-only financial ledger, dunning sweeps, and ledger-vs-provider
//! reconciliation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
