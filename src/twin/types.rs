//! Core identifier types for twins, models and relationships

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a twin (`$dtId`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TwinId(String);

impl TwinId {
    pub fn new(id: impl Into<String>) -> Self {
        TwinId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TwinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TwinId {
    fn from(s: String) -> Self {
        TwinId(s)
    }
}

impl From<&str> for TwinId {
    fn from(s: &str) -> Self {
        TwinId(s.to_string())
    }
}

impl AsRef<str> for TwinId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Model identifier (e.g., "dtmi:com:willowinc:HVACZone;1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(model: impl Into<String>) -> Self {
        ModelId(model.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        ModelId(s)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId(s.to_string())
    }
}

/// Unique identifier for a stored relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RelationshipId(String);

impl RelationshipId {
    pub fn new(id: impl Into<String>) -> Self {
        RelationshipId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RelationshipId {
    fn from(s: String) -> Self {
        RelationshipId(s)
    }
}

impl From<&str> for RelationshipId {
    fn from(s: &str) -> Self {
        RelationshipId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twin_id() {
        let id = TwinId::new("AHU-01");
        assert_eq!(id.as_str(), "AHU-01");
        assert_eq!(format!("{}", id), "AHU-01");

        let id2: TwinId = "VAV-02".into();
        assert_eq!(id2.as_str(), "VAV-02");
    }

    #[test]
    fn test_model_id() {
        let model = ModelId::new("dtmi:com:willowinc:Floor;1");
        assert_eq!(model.as_str(), "dtmi:com:willowinc:Floor;1");
        assert_eq!(model, ModelId::from("dtmi:com:willowinc:Floor;1"));
    }

    #[test]
    fn test_id_ordering() {
        let a = RelationshipId::new("rel-a");
        let b = RelationshipId::new("rel-b");
        assert!(a < b);
    }

    #[test]
    fn test_serde_transparent() {
        let id = TwinId::new("room-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"room-1\"");
        let back: TwinId = serde_json::from_str("\"room-1\"").unwrap();
        assert_eq!(back, id);
    }
}
