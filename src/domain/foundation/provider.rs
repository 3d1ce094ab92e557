//! Billing provider enumeration.
//!
//! Each provider is an external biller with its own adapter (out of scope
//! here) that normalizes notifications before they reach the core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External billing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Card payments via Stripe.
    Stripe,
    /// Apple App Store in-app purchases.
    AppStore,
    /// Google Play Store in-app purchases.
    PlayStore,
}

impl Provider {
    /// All known providers, in reconciliation sweep order.
    pub const ALL: [Provider; 3] = [Provider::Stripe, Provider::AppStore, Provider::PlayStore];

    /// Returns the wire name of this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Stripe => "stripe",
            Provider::AppStore => "app_store",
            Provider::PlayStore => "play_store",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_lists_every_provider() {
        assert_eq!(Provider::ALL.len(), 3);
    }

    #[test]
    fn as_str_matches_serde_representation() {
        for provider in Provider::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider.as_str()));
        }
    }

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(format!("{}", Provider::AppStore), "app_store");
    }
}
