//! Entitlement domain module.
//!
//! The derived, current feature grant for one user: the per-feature OR
//! over all of that user's currently entitled subscriptions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::foundation::{Timestamp, UserId};

/// The feature flags one subscription contributes, as mapped by the
/// entitlement-template collaborator for its provider/platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet(BTreeMap<String, bool>);

impl FeatureSet {
    /// Empty feature set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builds a set from feature/flag pairs.
    pub fn from_pairs(pairs: &[(&str, bool)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(name, flag)| (name.to_string(), *flag))
                .collect(),
        )
    }

    /// Sets a single flag.
    pub fn set(&mut self, feature: impl Into<String>, flag: bool) {
        self.0.insert(feature.into(), flag);
    }

    /// Returns the flag for a feature; absent features are false.
    pub fn has(&self, feature: &str) -> bool {
        self.0.get(feature).copied().unwrap_or(false)
    }

    /// Iterates over feature/flag pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.0.iter()
    }

    /// Per-feature OR with another set.
    pub fn union(&mut self, other: &FeatureSet) {
        for (feature, flag) in &other.0 {
            let entry = self.0.entry(feature.clone()).or_insert(false);
            *entry = *entry || *flag;
        }
    }
}

/// The derived entitlement record for one user.
///
/// Owned and exclusively written by the entitlement projector; read by
/// everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementSet {
    /// User this grant belongs to.
    pub user_id: UserId,

    /// Feature name to granted flag.
    pub features: FeatureSet,

    /// Optimistic concurrency version, bumped by the repository on every
    /// successful write.
    pub version: u64,

    /// When the projection last ran for this user.
    pub updated_at: Timestamp,
}

impl EntitlementSet {
    /// An empty grant for a user with no entitled subscriptions.
    pub fn empty(user_id: UserId, now: Timestamp) -> Self {
        Self {
            user_id,
            features: FeatureSet::new(),
            version: 0,
            updated_at: now,
        }
    }

    /// Returns the flag for a feature; absent features are false.
    pub fn has(&self, feature: &str) -> bool {
        self.features.has(feature)
    }
}
