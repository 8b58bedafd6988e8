//! Twin entity
//!
//! A twin is read-only for the duration of a traversal: builders clone the
//! values they receive from the store and never write back.

use super::property::{PropertyMap, PropertyValue};
use super::types::{ModelId, TwinId};
use serde::{Deserialize, Serialize};

/// A typed entity node in the relationship graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Twin {
    /// Unique identifier for this twin
    #[serde(rename = "$dtId")]
    pub id: TwinId,

    /// Model the twin is an instance of
    #[serde(rename = "$model")]
    pub model_id: ModelId,

    /// Open set of named properties
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Twin {
    /// Create a new twin without properties
    pub fn new(id: impl Into<TwinId>, model_id: impl Into<ModelId>) -> Self {
        Twin {
            id: id.into(),
            model_id: model_id.into(),
            properties: PropertyMap::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Display name, used to order tree siblings
    pub fn name(&self) -> Option<&str> {
        self.get_property("name").and_then(PropertyValue::as_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_twin() {
        let twin = Twin::new("room-1", "dtmi:com:willowinc:Room;1");
        assert_eq!(twin.id, TwinId::new("room-1"));
        assert_eq!(twin.model_id, ModelId::new("dtmi:com:willowinc:Room;1"));
        assert!(twin.properties.is_empty());
        assert_eq!(twin.name(), None);
    }

    #[test]
    fn test_twin_name() {
        let twin = Twin::new("ahu-1", "dtmi:com:willowinc:AirHandlingUnit;1")
            .with_property("name", "AHU 1")
            .with_property("capacity", 12i64);
        assert_eq!(twin.name(), Some("AHU 1"));

        // A non-string name is not a display name
        let numbered = Twin::new("lvl", "dtmi:com:willowinc:Level;1").with_property("name", 3i64);
        assert_eq!(numbered.name(), None);
    }

    #[test]
    fn test_twin_json_shape() {
        let json = r#"{
            "$dtId": "floor-3",
            "$model": "dtmi:com:willowinc:Floor;1",
            "properties": {"code": "L3"}
        }"#;
        let twin: Twin = serde_json::from_str(json).unwrap();
        assert_eq!(twin.id.as_str(), "floor-3");
        assert_eq!(twin.get_property("code").unwrap().as_string(), Some("L3"));
    }
}
