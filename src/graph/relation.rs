//! Relation vocabulary
//!
//! Predicates are interned: every `RelationLabel` created for a given name
//! through the same vocabulary shares one allocation, so labels compare by
//! pointer first. The vocabulary is open; unknown relationship names are
//! interned on first use like any other.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

pub const FEEDS: &str = "feeds";
pub const IS_FED_BY: &str = "isFedBy";
pub const IS_PART_OF: &str = "isPartOf";
pub const LOCATED_IN: &str = "locatedIn";
pub const INCLUDED_IN: &str = "includedIn";
pub const IS_CAPABILITY_OF: &str = "isCapabilityOf";
pub const HOSTED_BY: &str = "hostedBy";

/// Relationships that place a twin inside a larger physical twin
pub fn is_physical_containment(name: &str) -> bool {
    matches!(name, IS_PART_OF | LOCATED_IN | INCLUDED_IN)
}

static GLOBAL_VOCABULARY: LazyLock<RelationVocabulary> = LazyLock::new(RelationVocabulary::new);

/// Interning table for relation names
#[derive(Debug, Default)]
pub struct RelationVocabulary {
    labels: RwLock<HashSet<Arc<str>>>,
}

impl RelationVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide vocabulary used by [`RelationLabel::get`]
    pub fn global() -> &'static RelationVocabulary {
        &GLOBAL_VOCABULARY
    }

    /// Return the canonical label for `name`, interning it if needed
    pub fn intern(&self, name: &str) -> RelationLabel {
        {
            let labels = self.labels.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(existing) = labels.get(name) {
                return RelationLabel(Arc::clone(existing));
            }
        }

        let mut labels = self.labels.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have interned it between the two locks
        if let Some(existing) = labels.get(name) {
            return RelationLabel(Arc::clone(existing));
        }
        let label: Arc<str> = Arc::from(name);
        labels.insert(Arc::clone(&label));
        RelationLabel(label)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.labels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    pub fn len(&self) -> usize {
        self.labels.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interned predicate of a derived statement
#[derive(Clone)]
pub struct RelationLabel(Arc<str>);

impl RelationLabel {
    /// Canonical label for `name` from the global vocabulary
    pub fn get(name: &str) -> Self {
        RelationVocabulary::global().intern(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when both labels are the same interned instance
    pub fn ptr_eq(&self, other: &RelationLabel) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for RelationLabel {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for RelationLabel {}

impl Hash for RelationLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for RelationLabel {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelationLabel {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for RelationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelationLabel({})", &self.0)
    }
}

impl fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0)
    }
}

impl From<&str> for RelationLabel {
    fn from(name: &str) -> Self {
        RelationLabel::get(name)
    }
}

impl Serialize for RelationLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RelationLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(RelationLabel::get(&name))
    }
}
