//! Ledger domain module.
//!
//! Append-only log of financial and lifecycle facts.

mod entry;

pub use entry::{LedgerEntry, LedgerEntryType, TimeRange};
