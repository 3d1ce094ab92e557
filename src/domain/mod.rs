//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `subscription` - Subscription aggregate, status machine, transitions
//! - `entitlement` - Derived per-user feature grants
//! - `ledger` - Append-only financial/lifecycle facts

pub mod entitlement;
pub mod foundation;
pub mod ledger;
pub mod subscription;
