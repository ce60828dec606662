//! Property tests for the relationship graph invariants
//!
//! Random mutation sequences run against a small fixed set of entity types.
//! Individual operations may fail (name collisions, emptied target sets),
//! but a failed operation must leave the store untouched and a successful one
//! must leave the graph consistent.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::collections::{BTreeMap, BTreeSet};

use common::*;
use proptest::prelude::*;
use proptest::sample::Index;
use typegraph_core::ops::{RelationshipSynthesizer, WorkingSet};
use typegraph_core::rules::invariants;
use typegraph_core::{
    diff, Cardinality, DeleteAction, DeleteRequest, InMemoryEntityTypeStore,
    RelationshipDefinition, RelationshipKind, RelationshipMutator,
};

const KEYS: [&str; 4] = ["A", "B", "C", "D"];
const NAMES: [&str; 4] = ["Owner", "Parent", "Links", "Members"];

#[derive(Debug, Clone)]
enum Op {
    Create {
        source: usize,
        targets: BTreeSet<usize>,
        name: usize,
        inverse: Option<usize>,
        cardinality: Cardinality,
    },
    DeleteOrigin(Index),
    RemoveReference(Index, DeleteAction),
    ChangeCardinality(Index, Cardinality),
    ToggleBidirectional(Index, usize),
    /// Create again under an existing ORIGIN id with new targets
    Recreate {
        origin: Index,
        targets: BTreeSet<usize>,
        inverse: Option<usize>,
        cardinality: Cardinality,
    },
}

fn arb_cardinality() -> impl Strategy<Value = Cardinality> {
    prop_oneof![
        Just(Cardinality::OneToOne),
        Just(Cardinality::OneToMany),
        Just(Cardinality::ManyToOne),
        Just(Cardinality::ManyToMany),
    ]
}

fn arb_delete_action() -> impl Strategy<Value = DeleteAction> {
    prop_oneof![
        Just(DeleteAction::RemoveBidirectional),
        Just(DeleteAction::RemoveEntityType),
        Just(DeleteAction::DeleteRelationship),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (
            0..KEYS.len(),
            prop::collection::btree_set(0..KEYS.len(), 1..=3),
            0..NAMES.len(),
            prop::option::weighted(0.7, 0..NAMES.len()),
            arb_cardinality(),
        )
            .prop_map(|(source, targets, name, inverse, cardinality)| Op::Create {
                source,
                targets,
                name,
                inverse,
                cardinality,
            }),
        1 => any::<Index>().prop_map(Op::DeleteOrigin),
        2 => (any::<Index>(), arb_delete_action())
            .prop_map(|(idx, action)| Op::RemoveReference(idx, action)),
        1 => (any::<Index>(), arb_cardinality())
            .prop_map(|(idx, c)| Op::ChangeCardinality(idx, c)),
        1 => (any::<Index>(), 0..NAMES.len())
            .prop_map(|(idx, name)| Op::ToggleBidirectional(idx, name)),
        2 => (
            any::<Index>(),
            prop::collection::btree_set(0..KEYS.len(), 1..=3),
            prop::option::weighted(0.6, 0..NAMES.len()),
            arb_cardinality(),
        )
            .prop_map(|(origin, targets, inverse, cardinality)| Op::Recreate {
                origin,
                targets,
                inverse,
                cardinality,
            }),
    ]
}

fn relationships_where(
    store: &InMemoryEntityTypeStore,
    keep: impl Fn(&RelationshipDefinition) -> bool,
) -> Vec<RelationshipDefinition> {
    all_types(store)
        .into_iter()
        .flat_map(|t| t.relationships)
        .filter(|r| keep(r))
        .collect()
}

/// Push a single-record edit through the update path
fn update_one(
    store: &mut InMemoryEntityTypeStore,
    previous: &RelationshipDefinition,
    updated: RelationshipDefinition,
) {
    let current = entity_type(store, &previous.source_entity_type_key).relationships;
    let edited: Vec<RelationshipDefinition> = current
        .iter()
        .map(|r| if r.id == updated.id { updated.clone() } else { r.clone() })
        .collect();
    let _ = RelationshipMutator::new(store).update_relationships(&ctx(), diff(&current, &edited));
}

fn run(store: &mut InMemoryEntityTypeStore, op: &Op) {
    match op {
        Op::Create {
            source,
            targets,
            name,
            inverse,
            cardinality,
        } => {
            let target_keys: Vec<&str> = targets.iter().map(|i| KEYS[*i]).collect();
            let mut def = RelationshipDefinition::origin(
                "",
                NAMES[*name],
                KEYS[*source],
                *cardinality,
                target_keys.clone(),
            );
            if let Some(inverse) = inverse {
                def = def.with_bidirectional(NAMES[*inverse], target_keys);
            }
            let _ = RelationshipMutator::new(store)
                .create_relationships(&ctx(), vec![(KEYS[*source].to_string(), def)]);
        }
        Op::DeleteOrigin(idx) => {
            let origins = relationships_where(store, |r| r.is_origin());
            if origins.is_empty() {
                return;
            }
            let origin = idx.get(&origins).clone();
            let _ = RelationshipMutator::new(store).remove_relationships(
                &ctx(),
                vec![DeleteRequest::new(origin, DeleteAction::DeleteRelationship)],
            );
        }
        Op::RemoveReference(idx, action) => {
            let references = relationships_where(store, |r| r.is_reference());
            if references.is_empty() {
                return;
            }
            let reference = idx.get(&references).clone();
            let _ = RelationshipMutator::new(store)
                .remove_relationships(&ctx(), vec![DeleteRequest::new(reference, *action)]);
        }
        Op::ChangeCardinality(idx, cardinality) => {
            let origins = relationships_where(store, |r| r.is_origin());
            if origins.is_empty() {
                return;
            }
            let previous = idx.get(&origins).clone();
            let mut updated = previous.clone();
            updated.cardinality = *cardinality;
            update_one(store, &previous, updated);
        }
        Op::ToggleBidirectional(idx, name) => {
            let origins = relationships_where(store, |r| r.is_origin());
            if origins.is_empty() {
                return;
            }
            let previous = idx.get(&origins).clone();
            let mut updated = previous.clone();
            if previous.is_bidirectional_origin() {
                updated.kind = RelationshipKind::Origin {
                    inverse_name: previous.inverse_name().map(str::to_string),
                    bidirectional: false,
                    bidirectional_entity_type_keys: Some(previous.bidirectional_targets()),
                };
            } else {
                let inverse = previous.inverse_name().unwrap_or(NAMES[*name]).to_string();
                let targets = previous.target_keys();
                updated = updated.with_bidirectional(inverse, targets);
            }
            update_one(store, &previous, updated);
        }
        Op::Recreate {
            origin,
            targets,
            inverse,
            cardinality,
        } => {
            let origins = relationships_where(store, |r| r.is_origin());
            if origins.is_empty() {
                return;
            }
            let existing = origin.get(&origins).clone();
            let target_keys: Vec<&str> = targets.iter().map(|i| KEYS[*i]).collect();
            let mut def = RelationshipDefinition::origin(
                existing.id.clone(),
                existing.name.clone(),
                existing.source_entity_type_key.clone(),
                *cardinality,
                target_keys.clone(),
            );
            if let Some(inverse) = inverse {
                def = def.with_bidirectional(NAMES[*inverse], target_keys);
            }
            let source = existing.source_entity_type_key.clone();
            let _ = RelationshipMutator::new(store).create_relationships(&ctx(), vec![(source, def)]);
        }
    }
}

fn arb_relationships() -> impl Strategy<Value = BTreeMap<String, RelationshipDefinition>> {
    prop::collection::btree_map(
        (0..6u8).prop_map(|i| format!("r{i}")),
        (0..NAMES.len(), arb_cardinality(), 0..KEYS.len(), any::<bool>()),
        0..6,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, (name, cardinality, target, required))| {
                let mut def = RelationshipDefinition::origin(
                    id.clone(),
                    NAMES[name],
                    "A",
                    cardinality,
                    [KEYS[target]],
                );
                def.required = required;
                (id, def)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every mutation sequence keeps the graph consistent
    #[test]
    fn prop_mutations_preserve_invariants(ops in prop::collection::vec(arb_op(), 1..25)) {
        let mut store = store_with(&KEYS);

        for op in &ops {
            run(&mut store, op);
            let audit = invariants::audit(&all_types(&store));
            prop_assert!(audit.is_ok(), "{:?} after {:?}", audit, op);
        }
    }

    /// Applying a diff to its previous list reproduces the updated list
    #[test]
    fn prop_diff_round_trip(
        previous in arb_relationships(),
        updated in arb_relationships(),
    ) {
        let prev_list: Vec<_> = previous.values().cloned().collect();
        let upd_list: Vec<_> = updated.values().cloned().collect();
        let d = diff(&prev_list, &upd_list);

        let mut rebuilt = previous.clone();
        for removed in &d.removed {
            rebuilt.remove(&removed.id);
        }
        for added in &d.added {
            prop_assert!(!previous.contains_key(&added.id));
            rebuilt.insert(added.id.clone(), added.clone());
        }
        for modification in &d.modified {
            prop_assert_ne!(&modification.previous, &modification.updated);
            rebuilt.insert(modification.updated.id.clone(), modification.updated.clone());
        }

        prop_assert_eq!(rebuilt, updated);
        prop_assert!(diff(&upd_list, &upd_list).is_empty());
    }

    /// Synthesizing twice changes nothing the second time
    #[test]
    fn prop_synthesis_is_idempotent(
        source in 0..KEYS.len(),
        targets in prop::collection::btree_set(0..KEYS.len(), 1..=4),
        inverse in 0..NAMES.len(),
        cardinality in arb_cardinality(),
    ) {
        let store = store_with(&KEYS);
        let target_keys: Vec<&str> = targets.iter().map(|i| KEYS[*i]).collect();
        let origin = RelationshipDefinition::origin(
            "rel-origin",
            "Origin",
            KEYS[source],
            cardinality,
            target_keys.clone(),
        )
        .with_bidirectional(NAMES[inverse], target_keys);

        let synthesizer = RelationshipSynthesizer::default();
        let mut working_set = WorkingSet::new(WS);
        let first = synthesizer.synthesize_inverses(&origin, &mut working_set, &store).unwrap();
        let after_first: Vec<_> = working_set
            .types()
            .values()
            .map(|t| t.relationships.clone())
            .collect();

        let second = synthesizer.synthesize_inverses(&origin, &mut working_set, &store).unwrap();
        let after_second: Vec<_> = working_set
            .types()
            .values()
            .map(|t| t.relationships.clone())
            .collect();

        prop_assert_eq!(first, second);
        prop_assert_eq!(after_first, after_second);
    }
}
