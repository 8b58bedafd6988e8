//! Derived semantic graph
//!
//! - `relation`: interned predicate vocabulary
//! - `statement`: (subject, predicate, object) triples
//! - `model`: the deduplicating, concurrency-safe graph built by traversal

pub mod model;
pub mod relation;
pub mod statement;

pub use model::{GraphSnapshot, SnapshotEdge, StatementIter, TwinGraph};
pub use relation::{RelationLabel, RelationVocabulary};
pub use statement::{Provenance, Statement};
