//! Traversal engines
//!
//! - `system`: mode-tagged worklist traversal producing a semantic
//!   [`TwinGraph`](crate::graph::TwinGraph)
//! - `tree`: wave-parallel breadth-first traversal producing a [`TwinForest`]
//!
//! Both read the entity store through [`TwinStore`](crate::store::TwinStore)
//! and rebuild everything from scratch on each call.

pub mod cancel;
pub mod forest;
pub mod mode;
pub mod system;
pub mod tree;

pub use cancel::CancellationToken;
pub use forest::{sort_tree_nodes, ForestNode, NestedTwin, TwinForest};
pub use mode::TraversalMode;
pub use system::{SystemGraph, SystemGraphBuilder, Termination};
pub use tree::{TreeBuilder, TreeFilter};
