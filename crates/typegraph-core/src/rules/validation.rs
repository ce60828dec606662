use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, TypeGraphError};
use crate::model::{EntityType, RelationshipDefinition, RelationshipKind};

use super::invariants;

/// Which obligations a definition is checked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationOperation {
    Create,
    Update,
    Delete,
}

/// Validate a batch of relationship definitions against the resolved working set
///
/// Runs in three modes, chosen per definition:
///
/// 1. CREATE/UPDATE on an ORIGIN: shape is complete, every bidirectional
///    target carries exactly one REFERENCE for it, and no other resolved
///    entity type still holds one
/// 2. CREATE/UPDATE on a REFERENCE: its origin resolves and describes the
///    same edge from the other end
/// 3. DELETE: nothing still points at or is still linked to the removed
///    definition
///
/// Before any of that, every entity type in `resolved` is checked for
/// duplicate relationship names.
///
/// CREATE/UPDATE checks read the definition's final state from `resolved`
/// so later cascades in the same batch are honoured. A definition that no
/// longer exists on its source type was removed later in the batch and is
/// skipped.
///
/// # Errors
///
/// Fails fast on the first violation found.
pub fn validate(
    definitions: &[(RelationshipDefinition, ValidationOperation)],
    resolved: &BTreeMap<String, EntityType>,
) -> Result<()> {
    for et in resolved.values() {
        if let Some((entity_type_key, name)) =
            invariants::find_duplicate_names(std::slice::from_ref(et))
                .into_iter()
                .next()
        {
            return Err(TypeGraphError::DuplicateRelationshipName {
                entity_type_key,
                name,
            });
        }
    }

    for (definition, operation) in definitions {
        match operation {
            ValidationOperation::Create | ValidationOperation::Update => {
                let source = resolved
                    .get(&definition.source_entity_type_key)
                    .ok_or_else(|| TypeGraphError::EntityTypeNotResolved {
                        key: definition.source_entity_type_key.clone(),
                    })?;
                let Some(current) = source.relationship(&definition.id) else {
                    continue;
                };
                match current.kind {
                    RelationshipKind::Origin { .. } => validate_origin(current, resolved)?,
                    RelationshipKind::Reference { .. } => validate_reference(current, resolved)?,
                }
            }
            ValidationOperation::Delete => match definition.kind {
                RelationshipKind::Origin { .. } => validate_origin_deleted(definition, resolved)?,
                RelationshipKind::Reference { .. } => {
                    validate_reference_deleted(definition, resolved)?
                }
            },
        }
    }

    Ok(())
}

/// Shape checks for an ORIGIN that need no other entity type
///
/// Used as the pre-check before inverses are synthesized, when the
/// REFERENCEs cannot exist yet.
///
/// # Errors
///
/// - `MissingTargetTypes` for a non-polymorphic ORIGIN without targets
/// - `MissingInverseName` / `MissingBidirectionalTargets` for an incomplete
///   bidirectional ORIGIN
/// - `BidirectionalTargetNotAllowed` when a bidirectional target is outside
///   the target set of a non-polymorphic ORIGIN
pub fn validate_origin_shape(origin: &RelationshipDefinition) -> Result<()> {
    let RelationshipKind::Origin {
        inverse_name,
        bidirectional,
        bidirectional_entity_type_keys,
    } = &origin.kind
    else {
        return Ok(());
    };

    if !origin.allow_polymorphic && origin.entity_type_keys.is_none() {
        return Err(TypeGraphError::MissingTargetTypes {
            relationship_id: origin.id.clone(),
            name: origin.name.clone(),
        });
    }

    if !bidirectional {
        return Ok(());
    }

    if inverse_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(TypeGraphError::MissingInverseName {
            relationship_id: origin.id.clone(),
            name: origin.name.clone(),
        });
    }

    let Some(targets) = bidirectional_entity_type_keys else {
        return Err(TypeGraphError::MissingBidirectionalTargets {
            relationship_id: origin.id.clone(),
            name: origin.name.clone(),
        });
    };

    if !origin.allow_polymorphic {
        let allowed = origin.target_keys();
        if let Some(outside) = targets.iter().find(|t| !allowed.contains(*t)) {
            return Err(TypeGraphError::BidirectionalTargetNotAllowed {
                relationship_id: origin.id.clone(),
                name: origin.name.clone(),
                target_key: outside.clone(),
            });
        }
    }

    Ok(())
}

fn validate_origin(
    origin: &RelationshipDefinition,
    resolved: &BTreeMap<String, EntityType>,
) -> Result<()> {
    validate_origin_shape(origin)?;

    let targets = if origin.is_bidirectional_origin() {
        origin.bidirectional_targets()
    } else {
        BTreeSet::new()
    };

    // Every REFERENCE in the working set that still points here must sit on
    // a current bidirectional target
    for et in resolved.values().filter(|t| !targets.contains(&t.key)) {
        if let Some(reference) = et.references_for_origin(&origin.id).next() {
            return Err(TypeGraphError::OrphanedReference {
                origin_id: origin.id.clone(),
                reference_id: reference.id.clone(),
                entity_type_key: et.key.clone(),
            });
        }
    }

    if !origin.is_bidirectional_origin() {
        return Ok(());
    }

    for target in origin.bidirectional_targets() {
        let target_type =
            resolved
                .get(&target)
                .ok_or_else(|| TypeGraphError::EntityTypeNotResolved {
                    key: target.clone(),
                })?;

        match target_type.references_for_origin(&origin.id).count() {
            0 => {
                return Err(TypeGraphError::MissingInverseReference {
                    relationship_id: origin.id.clone(),
                    name: origin.name.clone(),
                    target_key: target,
                })
            }
            1 => {}
            count => {
                return Err(TypeGraphError::DuplicateInverseReference {
                    relationship_id: origin.id.clone(),
                    target_key: target,
                    count,
                })
            }
        }
    }

    Ok(())
}

fn validate_reference(
    reference: &RelationshipDefinition,
    resolved: &BTreeMap<String, EntityType>,
) -> Result<()> {
    let origin_id =
        reference
            .origin_relationship_id()
            .ok_or_else(|| TypeGraphError::MissingOriginId {
                relationship_id: reference.id.clone(),
                name: reference.name.clone(),
            })?;

    let origin = find_origin(origin_id, resolved).ok_or_else(|| {
        TypeGraphError::OriginRelationshipNotFound {
            reference_id: reference.id.clone(),
            origin_id: origin_id.to_string(),
        }
    })?;

    let mismatch = |reason: String| TypeGraphError::ReferenceMismatch {
        relationship_id: reference.id.clone(),
        origin_id: origin_id.to_string(),
        reason,
    };

    if !reference
        .target_keys()
        .contains(&origin.source_entity_type_key)
    {
        return Err(mismatch(format!(
            "reference does not target origin source {}",
            origin.source_entity_type_key
        )));
    }

    if !origin.is_bidirectional_origin() {
        return Err(mismatch("origin is not bidirectional".to_string()));
    }

    if !origin
        .bidirectional_targets()
        .contains(&reference.source_entity_type_key)
    {
        return Err(mismatch(format!(
            "origin does not list {} as a bidirectional target",
            reference.source_entity_type_key
        )));
    }

    Ok(())
}

fn validate_origin_deleted(
    origin: &RelationshipDefinition,
    resolved: &BTreeMap<String, EntityType>,
) -> Result<()> {
    for et in resolved.values() {
        if let Some(reference) = et.references_for_origin(&origin.id).next() {
            return Err(TypeGraphError::OrphanedReference {
                origin_id: origin.id.clone(),
                reference_id: reference.id.clone(),
                entity_type_key: et.key.clone(),
            });
        }
    }
    Ok(())
}

fn validate_reference_deleted(
    reference: &RelationshipDefinition,
    resolved: &BTreeMap<String, EntityType>,
) -> Result<()> {
    let Some(origin_id) = reference.origin_relationship_id() else {
        return Ok(());
    };

    // A fresh REFERENCE for the same origin may have replaced this one
    let relinked = resolved
        .get(&reference.source_entity_type_key)
        .is_some_and(|t| t.reference_for_origin(origin_id).is_some());
    if relinked {
        return Ok(());
    }

    if let Some(origin) = find_origin(origin_id, resolved) {
        if origin.is_bidirectional_origin()
            && origin
                .bidirectional_targets()
                .contains(&reference.source_entity_type_key)
        {
            return Err(TypeGraphError::ReferenceStillLinked {
                reference_id: reference.id.clone(),
                origin_id: origin_id.to_string(),
                entity_type_key: reference.source_entity_type_key.clone(),
            });
        }
    }

    Ok(())
}

fn find_origin<'a>(
    origin_id: &str,
    resolved: &'a BTreeMap<String, EntityType>,
) -> Option<&'a RelationshipDefinition> {
    resolved
        .values()
        .filter_map(|t| t.relationship(origin_id))
        .find(|r| r.is_origin())
}
