//! Static feature catalog.
//!
//! A fixed mapping from provider (and platform metadata) to the feature
//! template one subscription from that provider contributes. A real
//! deployment would load this from plan configuration; the shape of the
//! templates is what matters here: mobile-store plans grant mobile
//! features but explicitly carry `web: false`, which the projector's
//! OR-union must never let override a web grant from another
//! subscription.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::entitlement::FeatureSet;
use crate::domain::foundation::{DomainError, Provider};
use crate::ports::FeatureCatalog;

/// Catalog with one built-in template per provider.
pub struct StaticFeatureCatalog;

impl StaticFeatureCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticFeatureCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureCatalog for StaticFeatureCatalog {
    async fn features_for(
        &self,
        provider: Provider,
        metadata: &BTreeMap<String, String>,
    ) -> Result<FeatureSet, DomainError> {
        let mut features = match provider {
            Provider::Stripe => FeatureSet::from_pairs(&[
                ("premium", true),
                ("web", true),
                ("mobile", false),
            ]),
            Provider::AppStore | Provider::PlayStore => FeatureSet::from_pairs(&[
                ("premium", true),
                ("web", false),
                ("mobile", true),
            ]),
        };

        // Family plans add sharing regardless of provider
        if metadata.get("plan_family").map(String::as_str) == Some("true") {
            features.set("family_sharing", true);
        }

        Ok(features)
    }
}
