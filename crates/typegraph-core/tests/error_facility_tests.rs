use typegraph_core::errors::{ExError, ExErrorKind, TypeGraphError};

#[test]
fn test_entity_type_not_found_verifiable_by_kind() {
    let err = TypeGraphError::EntityTypeNotFound {
        workspace_id: "ws-1".to_string(),
        key: "Department".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.entity_type_key(), Some("Department"));
    assert_eq!(ex_err.relationship_id(), None);
}

#[test]
fn test_protected_distinct_from_validation() {
    let err = TypeGraphError::ProtectedRelationship {
        relationship_id: "rel-1".to_string(),
        name: "Owner".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Protected);
    assert_eq!(ex_err.code(), "ERR_PROTECTED_RELATIONSHIP");
    assert_ne!(ex_err.kind(), ExErrorKind::Validation);
    assert_eq!(ex_err.relationship_id(), Some("rel-1"));
}

#[test]
fn test_duplicate_name_structured_fields() {
    let err = TypeGraphError::DuplicateRelationshipName {
        entity_type_key: "Employee".to_string(),
        name: "Owner".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Validation);
    assert_eq!(ex_err.entity_type_key(), Some("Employee"));
    assert!(ex_err.message().contains("'Owner'"));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::Validation, "ERR_VALIDATION"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::Protected, "ERR_PROTECTED_RELATIONSHIP"),
        (ExErrorKind::IllegalState, "ERR_ILLEGAL_STATE"),
        (ExErrorKind::Forbidden, "ERR_FORBIDDEN"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_inverse_missing_is_illegal_state() {
    let err = TypeGraphError::InverseMissing {
        origin_id: "rel-1".to_string(),
        target_key: "Department".to_string(),
        op: "propagate_cardinality".to_string(),
    };

    let ex_err: ExError = (&err).into();

    assert_eq!(ex_err.kind(), ExErrorKind::IllegalState);
    assert_eq!(ex_err.entity_type_key(), Some("Department"));
    assert_eq!(ex_err.relationship_id(), Some("rel-1"));
    assert!(ex_err.message().contains("propagate_cardinality"));
}

#[test]
fn test_orphaned_reference_names_origin_and_holder() {
    let err = TypeGraphError::OrphanedReference {
        origin_id: "rel-1".to_string(),
        reference_id: "rel-2".to_string(),
        entity_type_key: "Project".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Validation);
    assert_eq!(ex_err.relationship_id(), Some("rel-1"));
    assert_eq!(ex_err.entity_type_key(), Some("Project"));
}

#[test]
fn test_kind_change_is_validation() {
    let err = TypeGraphError::RelationshipKindChanged {
        relationship_id: "rel-1".to_string(),
    };

    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert_eq!(err.relationship_id(), Some("rel-1"));
}

#[test]
fn test_serde_error_maps_to_serialization() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();

    let err: TypeGraphError = parse_err.into();

    assert_eq!(err.kind(), ExErrorKind::Serialization);
}

#[test]
fn test_ex_error_display_format() {
    let ex_err = ExError::new(ExErrorKind::NotFound)
        .with_op("remove_relationships")
        .with_message("Relationship not found")
        .with_relationship_id("rel-9");

    let display = format!("{}", ex_err);

    assert!(display.contains("ERR_NOT_FOUND"));
    assert!(display.contains("remove_relationships"));
    assert!(display.contains("Relationship not found"));
    assert!(display.contains("rel-9"));
}

#[test]
fn test_ex_error_builder_pattern() {
    let ex_err = ExError::new(ExErrorKind::Validation)
        .with_op("create_relationships")
        .with_entity_type_key("Employee")
        .with_message("Test message");

    assert_eq!(ex_err.kind(), ExErrorKind::Validation);
    assert_eq!(ex_err.op(), Some("create_relationships"));
    assert_eq!(ex_err.entity_type_key(), Some("Employee"));
    assert_eq!(ex_err.message(), "Test message");
}
