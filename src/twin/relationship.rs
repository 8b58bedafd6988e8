//! Relationship between two twins
//!
//! Relationship names are open strings: any name the store returns must be
//! representable, so there is no closed enum here.

use super::types::{RelationshipId, TwinId};
use serde::{Deserialize, Serialize};

/// A named, directed edge between two stored twins (source -> target)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier for this relationship
    #[serde(rename = "$relationshipId")]
    pub id: RelationshipId,

    /// Relationship name (e.g., "isPartOf", "isFedBy")
    #[serde(rename = "$relationshipName")]
    pub name: String,

    /// Source twin (relationship goes FROM this twin)
    #[serde(rename = "$sourceId")]
    pub source_id: TwinId,

    /// Target twin (relationship goes TO this twin)
    #[serde(rename = "$targetId")]
    pub target_id: TwinId,

    /// Optional substance carried along a feed (air, water, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substance: Option<String>,
}

impl Relationship {
    pub fn new(
        id: impl Into<RelationshipId>,
        source_id: impl Into<TwinId>,
        name: impl Into<String>,
        target_id: impl Into<TwinId>,
    ) -> Self {
        Relationship {
            id: id.into(),
            name: name.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            substance: None,
        }
    }

    pub fn with_substance(mut self, substance: impl Into<String>) -> Self {
        self.substance = Some(substance.into());
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Check if this relationship goes FROM a specific twin
    pub fn starts_from(&self, twin: &TwinId) -> bool {
        &self.source_id == twin
    }

    /// Check if this relationship goes TO a specific twin
    pub fn ends_at(&self, twin: &TwinId) -> bool {
        &self.target_id == twin
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Relationship {}

impl std::hash::Hash for Relationship {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
