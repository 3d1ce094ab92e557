//! Feature catalog port - the entitlement-template collaborator.
//!
//! Which features a provider/platform grants is policy, not mechanism,
//! so the mapping lives behind this port rather than in the projector.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::entitlement::FeatureSet;
use crate::domain::foundation::{DomainError, Provider};

/// Port for provider/platform feature templates.
#[async_trait]
pub trait FeatureCatalog: Send + Sync {
    /// The feature flags one subscription from this provider contributes,
    /// given its provider metadata (platform, store variant, ...).
    async fn features_for(
        &self,
        provider: Provider,
        metadata: &BTreeMap<String, String>,
    ) -> Result<FeatureSet, DomainError>;
}
