//! Traversal modes of the semantic graph builder
//!
//! A mode is attached to every frontier entry and decides which relationships
//! of that twin are followed when it is expanded.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraversalMode {
    /// Unrestricted: all outgoing and incoming relationships
    #[default]
    Default,
    /// Walk upstream along outgoing `isFedBy`
    Feeds,
    /// Walk downstream along incoming `isFedBy`
    IsFedBy,
    /// Climb physical containment (`isPartOf`, `locatedIn`, `includedIn`)
    PhysicalGreater,
    /// Reached through a capability; hosting edges are not followed
    IsCapabilityOf,
}

impl TraversalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraversalMode::Default => "default",
            TraversalMode::Feeds => "feeds",
            TraversalMode::IsFedBy => "isFedBy",
            TraversalMode::PhysicalGreater => "physicalGreater",
            TraversalMode::IsCapabilityOf => "isCapabilityOf",
        }
    }
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde_name() {
        for mode in [
            TraversalMode::Default,
            TraversalMode::Feeds,
            TraversalMode::IsFedBy,
            TraversalMode::PhysicalGreater,
            TraversalMode::IsCapabilityOf,
        ] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
        }
        assert_eq!(TraversalMode::default(), TraversalMode::Default);
    }
}
