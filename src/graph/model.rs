//! Graph Model
//!
//! In-memory directed graph of derived statements. Twins are kept once in an
//! arena keyed by id (the first instance seen wins) and statements refer to
//! them by id. Statements are never removed, so adjacency lists can hold
//! positions into the insertion-ordered statement set.
//!
//! All mutation goes through `&self`: the graph is shared between concurrent
//! expansion tasks and serializes inserts behind one lock.

use super::relation::RelationLabel;
use super::statement::{Provenance, Statement};
use crate::twin::{Relationship, RelationshipId, Twin, TwinId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct GraphInner {
    twins: IndexMap<TwinId, Twin>,
    statements: IndexMap<Statement, Provenance>,
    /// Subject -> positions in `statements`
    outgoing: HashMap<TwinId, Vec<usize>>,
    /// Object -> positions in `statements`
    incoming: HashMap<TwinId, Vec<usize>>,
}

/// Iterator over a snapshot of statements
///
/// Finite and detached from the graph; call the producing method again to
/// restart.
pub struct StatementIter {
    statements: std::vec::IntoIter<Statement>,
}

impl StatementIter {
    fn new(statements: Vec<Statement>) -> Self {
        Self { statements: statements.into_iter() }
    }
}

impl Iterator for StatementIter {
    type Item = Statement;

    fn next(&mut self) -> Option<Self::Item> {
        self.statements.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.statements.size_hint()
    }
}

impl ExactSizeIterator for StatementIter {}

/// Derived semantic graph over twins
#[derive(Debug, Default)]
pub struct TwinGraph {
    inner: RwLock<GraphInner>,
}

impl TwinGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, GraphInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GraphInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a statement; returns false when an identical one already exists
    pub fn add_statement(&self, subject: &Twin, predicate: RelationLabel, object: &Twin) -> bool {
        self.insert(subject, predicate, object, Provenance::default())
    }

    /// Insert a statement derived from a stored relationship
    pub fn add_statement_from(
        &self,
        subject: &Twin,
        predicate: RelationLabel,
        object: &Twin,
        relationship: &Relationship,
    ) -> bool {
        let provenance = Provenance {
            relationship_id: Some(relationship.id.clone()),
            substance: relationship.substance.clone(),
        };
        self.insert(subject, predicate, object, provenance)
    }

    fn insert(
        &self,
        subject: &Twin,
        predicate: RelationLabel,
        object: &Twin,
        provenance: Provenance,
    ) -> bool {
        let statement = Statement::new(subject.id.clone(), predicate, object.id.clone());
        let mut inner = self.write();

        if inner.statements.contains_key(&statement) {
            return false;
        }

        inner.twins.entry(subject.id.clone()).or_insert_with(|| subject.clone());
        inner.twins.entry(object.id.clone()).or_insert_with(|| object.clone());

        let (position, _) = inner.statements.insert_full(statement, provenance);
        inner.outgoing.entry(subject.id.clone()).or_default().push(position);
        inner.incoming.entry(object.id.clone()).or_default().push(position);
        true
    }

    /// Statements where `twin` is the subject, in insertion order
    pub fn outgoing_statements(&self, twin: &TwinId) -> StatementIter {
        let inner = self.read();
        StatementIter::new(Self::collect_positions(&inner, inner.outgoing.get(twin)))
    }

    /// Statements where `twin` is the object, in insertion order
    pub fn incoming_statements(&self, twin: &TwinId) -> StatementIter {
        let inner = self.read();
        StatementIter::new(Self::collect_positions(&inner, inner.incoming.get(twin)))
    }

    fn collect_positions(inner: &GraphInner, positions: Option<&Vec<usize>>) -> Vec<Statement> {
        positions
            .into_iter()
            .flatten()
            .filter_map(|&position| inner.statements.get_index(position))
            .map(|(statement, _)| statement.clone())
            .collect()
    }

    pub fn contains(&self, subject: &TwinId, predicate: &str, object: &TwinId) -> bool {
        let inner = self.read();
        inner
            .outgoing
            .get(subject)
            .into_iter()
            .flatten()
            .filter_map(|&position| inner.statements.get_index(position))
            .any(|(s, _)| &s.object == object && s.predicate.as_str() == predicate)
    }

    /// Number of statements
    pub fn len(&self) -> usize {
        self.read().statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().statements.is_empty()
    }

    /// Number of distinct twins referenced by statements
    pub fn node_count(&self) -> usize {
        self.read().twins.len()
    }

    pub fn twin(&self, id: &TwinId) -> Option<Twin> {
        self.read().twins.get(id).cloned()
    }

    pub fn twins(&self) -> Vec<Twin> {
        self.read().twins.values().cloned().collect()
    }

    /// All statements in insertion order
    pub fn statements(&self) -> StatementIter {
        StatementIter::new(self.read().statements.keys().cloned().collect())
    }

    /// All statements as a set, for order-insensitive comparison
    pub fn statement_set(&self) -> HashSet<Statement> {
        self.read().statements.keys().cloned().collect()
    }

    pub fn provenance(&self, statement: &Statement) -> Option<Provenance> {
        self.read().statements.get(statement).cloned()
    }

    /// Distinct predicates in first-use order
    pub fn predicates(&self) -> Vec<RelationLabel> {
        let inner = self.read();
        let mut seen = HashSet::new();
        inner
            .statements
            .keys()
            .filter(|s| seen.insert(s.predicate.clone()))
            .map(|s| s.predicate.clone())
            .collect()
    }

    /// Serializable copy of the graph for visualization consumers
    pub fn snapshot(&self) -> GraphSnapshot {
        let inner = self.read();
        GraphSnapshot {
            nodes: inner.twins.values().cloned().collect(),
            edges: inner
                .statements
                .iter()
                .map(|(statement, provenance)| SnapshotEdge {
                    subject: statement.subject.clone(),
                    predicate: statement.predicate.as_str().to_string(),
                    object: statement.object.clone(),
                    relationship_id: provenance.relationship_id.clone(),
                    substance: provenance.substance.clone(),
                })
                .collect(),
        }
    }
}

/// Edge of a [`GraphSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub subject: TwinId,
    pub predicate: String,
    pub object: TwinId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_id: Option<RelationshipId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substance: Option<String>,
}

/// Plain node/edge lists of a [`TwinGraph`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Twin>,
    pub edges: Vec<SnapshotEdge>,
}
