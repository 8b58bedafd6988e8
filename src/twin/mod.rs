//! Twin data model
//!
//! Twins, relationships and the identifier types shared by the store port,
//! the graph model and both traversal builders.

pub mod property;
pub mod relationship;
pub mod entity;
pub mod types;

pub use property::{PropertyMap, PropertyValue};
pub use relationship::Relationship;
pub use entity::Twin;
pub use types::{ModelId, RelationshipId, TwinId};
