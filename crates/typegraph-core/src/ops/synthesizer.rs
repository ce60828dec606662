//! Inverse REFERENCE synthesis
//!
//! Given a bidirectional ORIGIN, creates, refreshes, renames or removes the
//! REFERENCE mirror it owns on each target entity type. Every change lands
//! in the caller's `WorkingSet`; nothing is persisted here.

use std::collections::BTreeSet;

use tracing::debug;
use uuid::Uuid;

use super::store::EntityTypeStore;
use super::working_set::{JournalChange, WorkingSet};
use crate::errors::{Result, TypeGraphError};
use crate::model::{EntityType, RelationshipDefinition, RelationshipKind};

#[derive(Debug, Clone, Copy)]
pub struct RelationshipSynthesizer {
    suffix_start: u32,
}

impl Default for RelationshipSynthesizer {
    fn default() -> Self {
        Self { suffix_start: 2 }
    }
}

impl RelationshipSynthesizer {
    pub fn new(suffix_start: u32) -> Self {
        Self { suffix_start }
    }

    /// Upsert the REFERENCE for `origin` on every bidirectional target
    ///
    /// # Errors
    ///
    /// `MissingInverseName` if `origin` has no inverse name; loader errors
    /// for unknown targets.
    pub fn synthesize_inverses(
        &self,
        origin: &RelationshipDefinition,
        working_set: &mut WorkingSet,
        loader: &dyn EntityTypeStore,
    ) -> Result<Vec<RelationshipDefinition>> {
        let targets = origin.bidirectional_targets();
        self.synthesize_inverses_for(origin, &targets, working_set, loader)
    }

    /// Upsert the REFERENCE for `origin` on `targets` only
    ///
    /// An existing REFERENCE for the origin keeps its id and name; its
    /// cardinality, target set and protection are refreshed from the origin.
    /// A new one gets a fresh id and the origin's inverse name, suffixed
    /// `" 2"`, `" 3"`, … until unique on the target.
    ///
    /// # Errors
    ///
    /// Same as [`Self::synthesize_inverses`].
    pub fn synthesize_inverses_for(
        &self,
        origin: &RelationshipDefinition,
        targets: &BTreeSet<String>,
        working_set: &mut WorkingSet,
        loader: &dyn EntityTypeStore,
    ) -> Result<Vec<RelationshipDefinition>> {
        let inverse_name = origin
            .inverse_name()
            .ok_or_else(|| TypeGraphError::MissingInverseName {
                relationship_id: origin.id.clone(),
                name: origin.name.clone(),
            })?
            .to_string();

        let mut synthesized = Vec::with_capacity(targets.len());
        for target in targets {
            let target_type = working_set.resolve(target, loader)?;

            let (reference, change) = match target_type.reference_for_origin(&origin.id) {
                Some(existing) => {
                    let mut refreshed = existing.clone();
                    refresh_from_origin(&mut refreshed, origin);
                    (refreshed, JournalChange::Modified)
                }
                None => {
                    let name = self.unique_name(target_type, &inverse_name, None);
                    let mut reference = RelationshipDefinition::reference(
                        Uuid::now_v7().to_string(),
                        name,
                        target.clone(),
                        origin.cardinality.invert(),
                        origin.source_entity_type_key.clone(),
                        origin.id.clone(),
                    );
                    reference.protected = origin.protected;
                    (reference, JournalChange::Added)
                }
            };

            target_type.upsert_relationship(reference.clone());
            working_set.record(change, target, &reference);
            debug!(
                relationship_id = %origin.id,
                entity_type_key = %target,
                reference_id = %reference.id,
                reference_name = %reference.name,
                "synthesized inverse"
            );
            synthesized.push(reference);
        }

        Ok(synthesized)
    }

    /// Remove the REFERENCE for `origin_id` on `target_key`, if present
    ///
    /// An absent REFERENCE or a deleted target type is an already-cascaded
    /// state and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// `EntityTypeNotFound` if the target type never existed.
    pub fn remove_inverse(
        &self,
        target_key: &str,
        origin_id: &str,
        working_set: &mut WorkingSet,
        loader: &dyn EntityTypeStore,
    ) -> Result<Option<RelationshipDefinition>> {
        let target_type = match working_set.resolve(target_key, loader) {
            Ok(t) => t,
            Err(TypeGraphError::EntityTypeDeleted { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(reference_id) = target_type
            .reference_for_origin(origin_id)
            .map(|r| r.id.clone())
        else {
            return Ok(None);
        };

        let removed = target_type.remove_relationship(&reference_id);
        if let Some(reference) = &removed {
            working_set.record(JournalChange::Removed, target_key, reference);
            debug!(
                relationship_id = origin_id,
                entity_type_key = target_key,
                reference_id = %reference.id,
                "removed inverse"
            );
        }
        Ok(removed)
    }

    /// Follow an inverse-name change onto REFERENCEs still using the old default
    ///
    /// A REFERENCE is renamed only when its name is exactly the previous
    /// inverse name or matches `"<previous> <N>"`. Custom names are left alone.
    ///
    /// # Errors
    ///
    /// Loader errors for unknown targets.
    pub fn rename_inverse(
        &self,
        previous: &RelationshipDefinition,
        updated: &RelationshipDefinition,
        working_set: &mut WorkingSet,
        loader: &dyn EntityTypeStore,
    ) -> Result<Vec<RelationshipDefinition>> {
        let (Some(old_name), Some(new_name)) = (previous.inverse_name(), updated.inverse_name())
        else {
            return Ok(Vec::new());
        };

        let mut renamed = Vec::new();
        for target in updated.bidirectional_targets() {
            let target_type = working_set.resolve(&target, loader)?;
            let Some(mut reference) = target_type.reference_for_origin(&updated.id).cloned() else {
                continue;
            };
            if !is_default_inverse_name(&reference.name, old_name) {
                continue;
            }

            reference.name = self.unique_name(target_type, new_name, Some(&reference.id));
            target_type.upsert_relationship(reference.clone());
            working_set.record(JournalChange::Modified, &target, &reference);
            renamed.push(reference);
        }

        Ok(renamed)
    }

    /// Push the inverted cardinality of `updated` onto its existing REFERENCEs
    ///
    /// Only targets bidirectional both before and after the change are
    /// touched; the others are handled by synthesis or removal.
    ///
    /// # Errors
    ///
    /// `InverseMissing` if an expected REFERENCE does not exist.
    pub fn propagate_cardinality(
        &self,
        previous: &RelationshipDefinition,
        updated: &RelationshipDefinition,
        working_set: &mut WorkingSet,
        loader: &dyn EntityTypeStore,
    ) -> Result<Vec<RelationshipDefinition>> {
        if !(previous.is_bidirectional_origin() && updated.is_bidirectional_origin()) {
            return Ok(Vec::new());
        }

        let expected: BTreeSet<String> = previous
            .bidirectional_targets()
            .intersection(&updated.bidirectional_targets())
            .cloned()
            .collect();

        let mut propagated = Vec::with_capacity(expected.len());
        for target in expected {
            let target_type = working_set.resolve(&target, loader)?;
            let mut reference = target_type
                .reference_for_origin(&updated.id)
                .cloned()
                .ok_or_else(|| TypeGraphError::InverseMissing {
                    origin_id: updated.id.clone(),
                    target_key: target.clone(),
                    op: "propagate_cardinality".to_string(),
                })?;

            reference.cardinality = updated.cardinality.invert();
            target_type.upsert_relationship(reference.clone());
            working_set.record(JournalChange::Modified, &target, &reference);
            propagated.push(reference);
        }

        Ok(propagated)
    }

    fn unique_name(&self, entity_type: &EntityType, base: &str, except_id: Option<&str>) -> String {
        if !entity_type.is_name_taken(base, except_id) {
            return base.to_string();
        }

        let mut suffix = self.suffix_start;
        loop {
            let candidate = format!("{} {}", base, suffix);
            if !entity_type.is_name_taken(&candidate, except_id) {
                return candidate;
            }
            suffix = suffix.saturating_add(1);
        }
    }
}

fn refresh_from_origin(reference: &mut RelationshipDefinition, origin: &RelationshipDefinition) {
    reference.cardinality = origin.cardinality.invert();
    reference.entity_type_keys = Some(BTreeSet::from([origin.source_entity_type_key.clone()]));
    reference.protected = origin.protected;
    reference.kind = RelationshipKind::Reference {
        origin_relationship_id: Some(origin.id.clone()),
    };
}

/// `name` is `default` or `"<default> <N>"` for a decimal `N`
pub fn is_default_inverse_name(name: &str, default: &str) -> bool {
    if name == default {
        return true;
    }
    name.strip_prefix(default)
        .and_then(|rest| rest.strip_prefix(' '))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}
