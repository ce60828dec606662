//! Relationship diff output types.
//!
//! All types implement `Debug, Clone, Serialize, Deserialize, PartialEq`.
//! Change flags live in a `BTreeSet` for deterministic serialization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::RelationshipDefinition;

/// One way a relationship changed between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeFlag {
    NameChanged,
    CardinalityChanged,
    InverseNameChanged,
    /// `entity_type_keys` gained at least one key
    TargetTypesAdded,
    /// `entity_type_keys` lost at least one key
    TargetTypesRemoved,
    BidirectionalEnabled,
    BidirectionalDisabled,
    /// Bidirectional target set differs and bidirectional was not just enabled
    BidirectionalTargetsChanged,
}

/// A relationship present on both sides of a diff with different content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipModification {
    pub previous: RelationshipDefinition,
    pub updated: RelationshipDefinition,
    /// May be empty when only untracked fields (e.g. `required`) changed
    pub changes: BTreeSet<ChangeFlag>,
}

impl RelationshipModification {
    pub fn has(&self, flag: ChangeFlag) -> bool {
        self.changes.contains(&flag)
    }
}

/// Classification of two relationship lists matched by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDiff {
    /// Present only in the updated list, in updated-list order
    pub added: Vec<RelationshipDefinition>,
    /// Present only in the previous list, in previous-list order
    pub removed: Vec<RelationshipDefinition>,
    /// Present in both with different content, in updated-list order
    pub modified: Vec<RelationshipModification>,
}

impl RelationshipDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of relationship entries across all three buckets
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Every entity type key mentioned by any side of the diff
    pub fn referenced_keys(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        for rel in self.added.iter().chain(self.removed.iter()) {
            keys.extend(rel.referenced_keys());
        }
        for m in &self.modified {
            keys.extend(m.previous.referenced_keys());
            keys.extend(m.updated.referenced_keys());
        }
        keys
    }
}
