//! Derived (subject, predicate, object) statements

use super::relation::RelationLabel;
use crate::twin::{RelationshipId, TwinId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A semantic edge produced by traversal, not a stored relationship
///
/// Identity is the triple itself: two statements with equal subject id,
/// predicate name and object id are the same statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    pub subject: TwinId,
    pub predicate: RelationLabel,
    pub object: TwinId,
}

impl Statement {
    pub fn new(
        subject: impl Into<TwinId>,
        predicate: RelationLabel,
        object: impl Into<TwinId>,
    ) -> Self {
        Statement {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }

    /// Check if the statement touches `twin` on either side
    pub fn involves(&self, twin: &TwinId) -> bool {
        &self.subject == twin || &self.object == twin
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})-[{}]->({})", self.subject, self.predicate, self.object)
    }
}

/// Where a statement came from; the first insertion wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub relationship_id: Option<RelationshipId>,
    pub substance: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_identity() {
        let a = Statement::new("ahu-1", RelationLabel::get("feeds"), "vav-1");
        let b = Statement::new("ahu-1", RelationLabel::get("feeds"), "vav-1");
        let flipped = Statement::new("vav-1", RelationLabel::get("feeds"), "ahu-1");

        assert_eq!(a, b);
        assert_ne!(a, flipped);
        assert_eq!(format!("{}", a), "(ahu-1)-[feeds]->(vav-1)");
    }

    #[test]
    fn test_involves() {
        let s = Statement::new("room-1", RelationLabel::get("isPartOf"), "floor-1");
        assert!(s.involves(&TwinId::new("floor-1")));
        assert!(!s.involves(&TwinId::new("building")));
    }
}
