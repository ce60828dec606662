//! Relationship diff computation engine.
//!
//! The core entry point is [`diff`], which matches two relationship lists
//! by id and produces a [`RelationshipDiff`].

use std::collections::{BTreeMap, BTreeSet};

use crate::diff::model::{ChangeFlag, RelationshipDiff, RelationshipModification};
use crate::model::RelationshipDefinition;

/// Compute the diff between two relationship lists
///
/// Pure and deterministic. When an id appears more than once in a list
/// the first occurrence wins.
pub fn diff(
    previous: &[RelationshipDefinition],
    updated: &[RelationshipDefinition],
) -> RelationshipDiff {
    let previous_by_id = index_by_id(previous);
    let updated_by_id = index_by_id(updated);

    let mut result = RelationshipDiff::default();
    let mut seen = BTreeSet::new();

    for rel in updated {
        if !seen.insert(rel.id.as_str()) {
            continue;
        }
        match previous_by_id.get(rel.id.as_str()) {
            None => result.added.push(rel.clone()),
            Some(prev) if *prev != rel => result.modified.push(RelationshipModification {
                previous: (*prev).clone(),
                updated: rel.clone(),
                changes: change_flags(prev, rel),
            }),
            Some(_) => {}
        }
    }

    let mut seen_removed = BTreeSet::new();
    for rel in previous {
        if !updated_by_id.contains_key(rel.id.as_str()) && seen_removed.insert(rel.id.as_str()) {
            result.removed.push(rel.clone());
        }
    }

    result
}

/// Field-by-field change flags for two versions of one relationship
pub fn change_flags(
    previous: &RelationshipDefinition,
    updated: &RelationshipDefinition,
) -> BTreeSet<ChangeFlag> {
    let mut flags = BTreeSet::new();

    if previous.name != updated.name {
        flags.insert(ChangeFlag::NameChanged);
    }
    if previous.cardinality != updated.cardinality {
        flags.insert(ChangeFlag::CardinalityChanged);
    }
    if previous.inverse_name() != updated.inverse_name() {
        flags.insert(ChangeFlag::InverseNameChanged);
    }

    let previous_targets = previous.target_keys();
    let updated_targets = updated.target_keys();
    if updated_targets.difference(&previous_targets).next().is_some() {
        flags.insert(ChangeFlag::TargetTypesAdded);
    }
    if previous_targets.difference(&updated_targets).next().is_some() {
        flags.insert(ChangeFlag::TargetTypesRemoved);
    }

    let was_bidirectional = previous.is_bidirectional_origin();
    let is_bidirectional = updated.is_bidirectional_origin();
    let enabled = !was_bidirectional && is_bidirectional;
    if enabled {
        flags.insert(ChangeFlag::BidirectionalEnabled);
    }
    if was_bidirectional && !is_bidirectional {
        flags.insert(ChangeFlag::BidirectionalDisabled);
    }

    if !enabled
        && (was_bidirectional || is_bidirectional)
        && previous.bidirectional_targets() != updated.bidirectional_targets()
    {
        flags.insert(ChangeFlag::BidirectionalTargetsChanged);
    }

    flags
}

fn index_by_id(rels: &[RelationshipDefinition]) -> BTreeMap<&str, &RelationshipDefinition> {
    let mut index = BTreeMap::new();
    for rel in rels {
        index.entry(rel.id.as_str()).or_insert(rel);
    }
    index
}
