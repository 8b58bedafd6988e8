//! Parent-labelled forest produced by the tree builder
//!
//! Nodes live in an arena keyed by twin id and refer to each other by id, so
//! a twin reached over several edges is stored once. [`NestedTwin`] is the
//! owned, recursive view handed to callers.

use crate::twin::{Twin, TwinId};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// One processed twin and its resolved parent
#[derive(Debug, Clone, PartialEq)]
pub struct ForestNode {
    pub twin: Twin,
    pub parent_id: Option<TwinId>,
    /// Ids of nodes whose `parent_id` is this node, in discovery order
    pub children: Vec<TwinId>,
}

/// A twin with its subtree, as returned by the tree queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedTwin {
    pub twin: Twin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TwinId>,
    #[serde(default)]
    pub children: Vec<NestedTwin>,
}

impl NestedTwin {
    pub fn id(&self) -> &TwinId {
        &self.twin.id
    }

    /// Number of twins in this subtree, including this one
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(NestedTwin::size).sum::<usize>()
    }

    pub fn child(&self, id: &str) -> Option<&NestedTwin> {
        self.children.iter().find(|child| child.twin.id.as_str() == id)
    }

    /// Ids of this subtree in depth-first pre-order
    pub fn ids(&self) -> Vec<TwinId> {
        let mut ids = Vec::with_capacity(self.size());
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<TwinId>) {
        ids.push(self.twin.id.clone());
        for child in &self.children {
            child.collect_ids(ids);
        }
    }
}

/// Order sibling trees by their `name` property, at every level
///
/// Two names of the form `"<word> <integer>"` with the same word compare by
/// the number, so "Region 9" comes before "Region 10". Unnamed twins sort
/// first and the sort is stable, so equal keys keep discovery order.
pub fn sort_tree_nodes(nodes: &mut [NestedTwin]) {
    for node in nodes.iter_mut() {
        sort_tree_nodes(&mut node.children);
    }
    nodes.sort_by(|a, b| name_key(a.twin.name()).cmp(&name_key(b.twin.name())));
}

fn name_key(name: Option<&str>) -> Option<(&str, Option<i64>, &str)> {
    let name = name?;
    let numbered = name
        .split_once(' ')
        .filter(|(_, number)| !number.contains(' '))
        .and_then(|(word, number)| number.parse::<i64>().ok().map(|n| (word, n)));

    Some(match numbered {
        Some((word, number)) => (word, Some(number), name),
        None => (name, None, name),
    })
}

/// Arena of processed twins keyed by id, in processing order
#[derive(Debug, Clone, Default)]
pub struct TwinForest {
    nodes: IndexMap<TwinId, ForestNode>,
}

impl TwinForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a processed twin; the first record of an id wins
    pub fn insert(&mut self, twin: Twin, parent_id: Option<TwinId>) -> bool {
        if self.nodes.contains_key(&twin.id) {
            return false;
        }
        self.nodes.insert(
            twin.id.clone(),
            ForestNode {
                twin,
                parent_id,
                children: Vec::new(),
            },
        );
        true
    }

    /// Fill the children lists from the parent pointers
    ///
    /// A parent outside the arena leaves the node as a root of the forest.
    pub fn link_children(&mut self) {
        let links: Vec<(TwinId, TwinId)> = self
            .nodes
            .values()
            .filter_map(|node| {
                let parent = node.parent_id.as_ref()?;
                self.nodes
                    .contains_key(parent)
                    .then(|| (parent.clone(), node.twin.id.clone()))
            })
            .collect();

        for (parent, child) in links {
            if let Some(node) = self.nodes.get_mut(&parent) {
                if !node.children.contains(&child) {
                    node.children.push(child);
                }
            }
        }
    }

    pub fn get(&self, id: &TwinId) -> Option<&ForestNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &TwinId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ForestNode> {
        self.nodes.values()
    }

    /// Nodes without a parent pointer
    pub fn roots(&self) -> Vec<TwinId> {
        self.nodes
            .values()
            .filter(|node| node.parent_id.is_none())
            .map(|node| node.twin.id.clone())
            .collect()
    }

    /// Nodes whose parent is one of `parents`
    pub fn children_of(&self, parents: &[TwinId]) -> Vec<TwinId> {
        let parents: FxHashSet<&TwinId> = parents.iter().collect();
        self.nodes
            .values()
            .filter(|node| node.parent_id.as_ref().is_some_and(|p| parents.contains(p)))
            .map(|node| node.twin.id.clone())
            .collect()
    }

    /// Materialize the subtree rooted at `id`
    ///
    /// Parent pointers can form a cycle (A isPartOf B, B isPartOf A); a node
    /// already on the current path is not entered again.
    pub fn nested(&self, id: &TwinId) -> Option<NestedTwin> {
        let mut path = FxHashSet::default();
        self.materialize(id, &mut path)
    }

    pub fn nested_all(&self, ids: &[TwinId]) -> Vec<NestedTwin> {
        ids.iter().filter_map(|id| self.nested(id)).collect()
    }

    fn materialize(&self, id: &TwinId, path: &mut FxHashSet<TwinId>) -> Option<NestedTwin> {
        let node = self.nodes.get(id)?;
        path.insert(id.clone());
        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            if path.contains(child) {
                continue;
            }
            if let Some(nested) = self.materialize(child, path) {
                children.push(nested);
            }
        }
        path.remove(id);

        Some(NestedTwin {
            twin: node.twin.clone(),
            parent_id: node.parent_id.clone(),
            children,
        })
    }
}
