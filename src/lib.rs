//! Twinscope
//!
//! Relationship-graph traversal and tree reconstruction over a store of
//! building digital twins.
//!
//! # Components
//!
//! - **Graph Model** (`graph`): deduplicating, concurrency-safe set of derived
//!   (subject, predicate, object) statements with interned predicates
//! - **Semantic Graph Builder** (`traversal::system`): mode-tagged breadth-first
//!   traversal that follows different relationships depending on how a twin
//!   was reached
//! - **Tree Builder** (`traversal::tree`): wave-parallel breadth-first traversal
//!   producing a parent-labelled forest
//! - **Query facade** (`service`): trees by root ids, trees by root models and
//!   the system graph
//!
//! All store access goes through the [`TwinStore`] trait; [`InMemoryTwinStore`]
//! is the bundled implementation.
//!
//! ## Example Usage
//!
//! ```rust
//! use twinscope::{InMemoryTwinStore, TwinService, Twin, TwinId};
//! use std::sync::Arc;
//!
//! let mut store = InMemoryTwinStore::new();
//! store.add_twin(Twin::new("ahu-1", "dtmi:com:willowinc:AirHandlingUnit;1"));
//! store.add_twin(Twin::new("vav-1", "dtmi:com:willowinc:VAVBox;1"));
//! store.relate("vav-1", "isFedBy", "ahu-1");
//!
//! let service = TwinService::with_default_config(Arc::new(store));
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let graph = runtime
//!     .block_on(service.build_system_graph(&[TwinId::new("vav-1")]))
//!     .unwrap();
//!
//! // isFedBy is reported in the feeds direction
//! assert!(graph.contains(&TwinId::new("ahu-1"), "feeds", &TwinId::new("vav-1")));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod graph;
pub mod service;
pub mod store;
pub mod traversal;
pub mod twin;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, TraversalConfig};
pub use error::{TraversalError, TraversalResult};
pub use graph::{GraphSnapshot, RelationLabel, Statement, TwinGraph};
pub use service::TwinService;
pub use store::{
    collect_all_pages, InMemoryTwinStore, ModelQuery, Page, StoreError, StoreResult, TwinStore,
};
pub use traversal::{
    sort_tree_nodes, CancellationToken, NestedTwin, SystemGraph, SystemGraphBuilder, Termination,
    TraversalMode, TreeBuilder, TreeFilter, TwinForest,
};
pub use twin::{
    ModelId, PropertyMap, PropertyValue, Relationship, RelationshipId, Twin, TwinId,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
