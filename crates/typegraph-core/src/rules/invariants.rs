use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{Result, TypeGraphError};
use crate::model::{EntityType, RelationshipDefinition};

fn by_key(types: &[EntityType]) -> BTreeMap<&str, &EntityType> {
    types.iter().map(|t| (t.key.as_str(), t)).collect()
}

fn bidirectional_origins(
    types: &[EntityType],
) -> impl Iterator<Item = (&EntityType, &RelationshipDefinition)> {
    types.iter().flat_map(|t| {
        t.relationships
            .iter()
            .filter(|r| r.is_bidirectional_origin())
            .map(move |r| (t, r))
    })
}

/// Find bidirectional targets that carry no REFERENCE for their ORIGIN
///
/// A target whose entity type is absent from `types` is reported too.
///
/// Returns list of (origin_id, target_key) tuples
pub fn find_missing_inverses(types: &[EntityType]) -> Vec<(String, String)> {
    let index = by_key(types);
    let mut missing = Vec::new();

    for (_, origin) in bidirectional_origins(types) {
        for target in origin.bidirectional_targets() {
            let has_inverse = index
                .get(target.as_str())
                .is_some_and(|t| t.reference_for_origin(&origin.id).is_some());
            if !has_inverse {
                missing.push((origin.id.clone(), target));
            }
        }
    }

    missing
}

/// Find entity types carrying more than one REFERENCE for the same ORIGIN
///
/// Returns list of (origin_id, entity_type_key, count) tuples
pub fn find_duplicate_inverses(types: &[EntityType]) -> Vec<(String, String, usize)> {
    let mut duplicates = Vec::new();

    for et in types {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for origin_id in et
            .relationships
            .iter()
            .filter_map(|r| r.origin_relationship_id())
        {
            *counts.entry(origin_id).or_default() += 1;
        }
        for (origin_id, count) in counts {
            if count > 1 {
                duplicates.push((origin_id.to_string(), et.key.clone(), count));
            }
        }
    }

    duplicates
}

/// Find REFERENCEs whose ORIGIN is gone or no longer lists their entity type
///
/// A REFERENCE with no origin id at all is orphaned as well.
///
/// Returns list of (reference_id, entity_type_key) tuples
pub fn find_orphaned_references(types: &[EntityType]) -> Vec<(String, String)> {
    let origins: BTreeMap<&str, &RelationshipDefinition> = types
        .iter()
        .flat_map(|t| t.relationships.iter())
        .filter(|r| r.is_origin())
        .map(|r| (r.id.as_str(), r))
        .collect();

    let mut orphans = Vec::new();
    for et in types {
        for reference in et.relationships.iter().filter(|r| r.is_reference()) {
            let linked = reference
                .origin_relationship_id()
                .and_then(|id| origins.get(id))
                .is_some_and(|origin| {
                    origin.is_bidirectional_origin()
                        && origin.bidirectional_targets().contains(&et.key)
                });
            if !linked {
                orphans.push((reference.id.clone(), et.key.clone()));
            }
        }
    }

    orphans
}

/// Find non-polymorphic ORIGINs whose bidirectional targets are not all
/// declared targets
///
/// Returns list of (origin_id, target_key) tuples
pub fn find_bidirectional_targets_outside_target_set(
    types: &[EntityType],
) -> Vec<(String, String)> {
    let mut violations = Vec::new();

    for (_, origin) in bidirectional_origins(types) {
        if origin.allow_polymorphic {
            continue;
        }
        let allowed = origin.target_keys();
        for target in origin.bidirectional_targets().difference(&allowed) {
            violations.push((origin.id.clone(), target.clone()));
        }
    }

    violations
}

/// Find relationship names declared more than once on one entity type
///
/// Returns list of (entity_type_key, name) tuples
pub fn find_duplicate_names(types: &[EntityType]) -> Vec<(String, String)> {
    let mut duplicates = Vec::new();

    for et in types {
        let mut seen = BTreeSet::new();
        let mut reported = BTreeSet::new();
        for rel in &et.relationships {
            if !seen.insert(rel.name.as_str()) && reported.insert(rel.name.as_str()) {
                duplicates.push((et.key.clone(), rel.name.clone()));
            }
        }
    }

    duplicates
}

/// Check every graph invariant over a closed set of entity types
///
/// `types` must contain every entity type the relationships mention;
/// a target outside the set counts as a missing inverse.
///
/// # Errors
///
/// Returns the first violation found, checking names, target sets,
/// missing inverses, duplicate inverses and orphans in that order. Call the
/// individual `find_*` functions for exhaustive reporting.
pub fn audit(types: &[EntityType]) -> Result<()> {
    if let Some((entity_type_key, name)) = find_duplicate_names(types).into_iter().next() {
        return Err(TypeGraphError::DuplicateRelationshipName {
            entity_type_key,
            name,
        });
    }

    if let Some((relationship_id, target_key)) =
        find_bidirectional_targets_outside_target_set(types)
            .into_iter()
            .next()
    {
        let name = relationship_name(types, &relationship_id);
        return Err(TypeGraphError::BidirectionalTargetNotAllowed {
            relationship_id,
            name,
            target_key,
        });
    }

    if let Some((relationship_id, target_key)) = find_missing_inverses(types).into_iter().next() {
        let name = relationship_name(types, &relationship_id);
        return Err(TypeGraphError::MissingInverseReference {
            relationship_id,
            name,
            target_key,
        });
    }

    if let Some((relationship_id, target_key, count)) =
        find_duplicate_inverses(types).into_iter().next()
    {
        return Err(TypeGraphError::DuplicateInverseReference {
            relationship_id,
            target_key,
            count,
        });
    }

    if let Some((reference_id, entity_type_key)) =
        find_orphaned_references(types).into_iter().next()
    {
        let origin_id = types
            .iter()
            .find_map(|t| t.relationship(&reference_id))
            .and_then(|r| r.origin_relationship_id())
            .unwrap_or_default()
            .to_string();
        return Err(TypeGraphError::OrphanedReference {
            origin_id,
            reference_id,
            entity_type_key,
        });
    }

    Ok(())
}

fn relationship_name(types: &[EntityType], id: &str) -> String {
    types
        .iter()
        .find_map(|t| t.relationship(id))
        .map(|r| r.name.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Cardinality;

    fn et(key: &str) -> EntityType {
        EntityType::new(format!("et-{}", key), "ws-1".to_string(), key.to_string())
    }

    fn manager_origin() -> RelationshipDefinition {
        RelationshipDefinition::origin(
            "r1",
            "Manager",
            "Employee",
            Cardinality::ManyToOne,
            ["Department"],
        )
        .with_bidirectional("Employees", ["Department"])
    }

    fn employees_reference() -> RelationshipDefinition {
        RelationshipDefinition::reference(
            "r2",
            "Employees",
            "Department",
            Cardinality::OneToMany,
            "Employee",
            "r1",
        )
    }

    fn consistent_graph() -> Vec<EntityType> {
        let mut employee = et("Employee");
        employee.upsert_relationship(manager_origin());
        let mut department = et("Department");
        department.upsert_relationship(employees_reference());
        vec![employee, department]
    }

    #[test]
    fn test_consistent_graph_passes_audit() {
        let types = consistent_graph();
        assert!(audit(&types).is_ok());
        assert!(find_missing_inverses(&types).is_empty());
        assert!(find_orphaned_references(&types).is_empty());
    }

    #[test]
    fn test_missing_inverse_detected() {
        let mut types = consistent_graph();
        types[1].remove_relationship("r2");

        assert_eq!(
            find_missing_inverses(&types),
            vec![("r1".to_string(), "Department".to_string())]
        );
        assert!(matches!(
            audit(&types),
            Err(TypeGraphError::MissingInverseReference { .. })
        ));
    }

    #[test]
    fn test_orphan_detected_when_origin_removed() {
        let mut types = consistent_graph();
        types[0].remove_relationship("r1");

        assert_eq!(
            find_orphaned_references(&types),
            vec![("r2".to_string(), "Department".to_string())]
        );
        assert!(matches!(
            audit(&types),
            Err(TypeGraphError::OrphanedReference { ref origin_id, .. }) if origin_id == "r1"
        ));
    }

    #[test]
    fn test_duplicate_inverse_detected() {
        let mut types = consistent_graph();
        let mut second = employees_reference();
        second.id = "r3".to_string();
        second.name = "Employees 2".to_string();
        types[1].upsert_relationship(second);

        assert_eq!(
            find_duplicate_inverses(&types),
            vec![("r1".to_string(), "Department".to_string(), 2)]
        );
    }

    #[test]
    fn test_bidirectional_target_outside_target_set() {
        let mut types = consistent_graph();
        if let Some(origin) = types[0].relationship_mut("r1") {
            origin.entity_type_keys = Some(BTreeSet::from(["Project".to_string()]));
        }

        assert_eq!(
            find_bidirectional_targets_outside_target_set(&types),
            vec![("r1".to_string(), "Department".to_string())]
        );
    }

    #[test]
    fn test_polymorphic_origin_exempt_from_target_set_check() {
        let mut types = consistent_graph();
        if let Some(origin) = types[0].relationship_mut("r1") {
            origin.allow_polymorphic = true;
            origin.entity_type_keys = None;
        }
        assert!(find_bidirectional_targets_outside_target_set(&types).is_empty());
    }

    #[test]
    fn test_duplicate_name_reported_once() {
        let mut employee = et("Employee");
        for id in ["a", "b", "c"] {
            employee.relationships.push(RelationshipDefinition::origin(
                id,
                "Owner",
                "Employee",
                Cardinality::ManyToOne,
                ["Employee"],
            ));
        }

        assert_eq!(
            find_duplicate_names(&[employee]),
            vec![("Employee".to_string(), "Owner".to_string())]
        );
    }
}
