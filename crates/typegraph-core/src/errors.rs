use thiserror::Error;
use typegraph_core_types::{RequestId, TraceId};

/// Result type alias using TypeGraphError
pub type Result<T> = std::result::Result<T, TypeGraphError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every `TypeGraphError` variant maps onto exactly one kind. Kinds carry a
/// stable code so callers can branch on them and render UI messages without
/// matching on concrete variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExErrorKind {
    /// Caller/input fault: naming collision, missing field, inconsistent target sets,
    /// orphaned or missing inverse detected by the validator
    Validation,
    /// Referenced entity type or relationship id does not exist
    NotFound,
    /// Attempted deletion of a system-managed relationship
    Protected,
    /// An inverse the invariants guarantee is missing; a prior consistency violation
    IllegalState,
    /// The access policy rejected the request before any load happened
    Forbidden,

    // Integration
    Persistence,
    Serialization,

    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Protected => "ERR_PROTECTED_RELATIONSHIP",
            ExErrorKind::IllegalState => "ERR_ILLEGAL_STATE",
            ExErrorKind::Forbidden => "ERR_FORBIDDEN",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error
///
/// Carries the classification plus enough context (operation, entity type,
/// relationship, correlation ids) for a caller to build an actionable message.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_type_key: Option<String>,
    relationship_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_type_key: None,
            relationship_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_entity_type_key(mut self, key: impl Into<String>) -> Self {
        self.entity_type_key = Some(key.into());
        self
    }

    pub fn with_relationship_id(mut self, id: impl Into<String>) -> Self {
        self.relationship_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_type_key(&self) -> Option<&str> {
        self.entity_type_key.as_deref()
    }

    pub fn relationship_id(&self) -> Option<&str> {
        self.relationship_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.entity_type_key {
            write!(f, " (entity_type_key: {})", key)?;
        }
        if let Some(id) = &self.relationship_id {
            write!(f, " (relationship_id: {})", id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for relationship mutations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeGraphError {
    // ===== Validation =====
    #[error("Relationship name '{name}' is declared more than once on entity type {entity_type_key}")]
    DuplicateRelationshipName {
        entity_type_key: String,
        name: String,
    },

    #[error("Bidirectional relationship '{name}' ({relationship_id}) has no inverse name")]
    MissingInverseName {
        relationship_id: String,
        name: String,
    },

    #[error("Bidirectional relationship '{name}' ({relationship_id}) does not declare its bidirectional entity types")]
    MissingBidirectionalTargets {
        relationship_id: String,
        name: String,
    },

    #[error("Relationship '{name}' ({relationship_id}) has no target entity types and is not polymorphic")]
    MissingTargetTypes {
        relationship_id: String,
        name: String,
    },

    #[error("Relationship '{name}' ({relationship_id}) lists {target_key} as bidirectional but not as a target entity type")]
    BidirectionalTargetNotAllowed {
        relationship_id: String,
        name: String,
        target_key: String,
    },

    #[error("Relationship '{name}' ({relationship_id}) is missing its inverse REFERENCE on entity type {target_key}")]
    MissingInverseReference {
        relationship_id: String,
        name: String,
        target_key: String,
    },

    #[error("Entity type {target_key} carries {count} REFERENCE relationships for origin {relationship_id}")]
    DuplicateInverseReference {
        relationship_id: String,
        target_key: String,
        count: usize,
    },

    #[error("REFERENCE relationship '{name}' ({relationship_id}) has no origin relationship id")]
    MissingOriginId {
        relationship_id: String,
        name: String,
    },

    #[error("REFERENCE relationship {relationship_id} does not mirror origin {origin_id}: {reason}")]
    ReferenceMismatch {
        relationship_id: String,
        origin_id: String,
        reason: String,
    },

    #[error("Origin relationship {origin_id} still has REFERENCE {reference_id} on entity type {entity_type_key}")]
    OrphanedReference {
        origin_id: String,
        reference_id: String,
        entity_type_key: String,
    },

    #[error("REFERENCE {reference_id} is still listed by origin {origin_id} for entity type {entity_type_key}")]
    ReferenceStillLinked {
        reference_id: String,
        origin_id: String,
        entity_type_key: String,
    },

    #[error("Relationship {relationship_id} cannot change between ORIGIN and REFERENCE")]
    RelationshipKindChanged { relationship_id: String },

    #[error("Invalid relationship {relationship_id}: {reason}")]
    InvalidRelationship {
        relationship_id: String,
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // ===== Not found =====
    #[error("Entity type not found: {key} in workspace {workspace_id}")]
    EntityTypeNotFound { workspace_id: String, key: String },

    #[error("Entity type not found: id {id}")]
    EntityTypeIdNotFound { id: String },

    #[error("Entity type was deleted: {key}")]
    EntityTypeDeleted { key: String },

    #[error("Entity type {key} is not part of the resolved working set")]
    EntityTypeNotResolved { key: String },

    #[error("Relationship {relationship_id} not found on entity type {entity_type_key}")]
    RelationshipNotFound {
        entity_type_key: String,
        relationship_id: String,
    },

    #[error("Origin relationship {origin_id} referenced by {reference_id} does not exist")]
    OriginRelationshipNotFound {
        reference_id: String,
        origin_id: String,
    },

    // ===== Protected =====
    #[error("Relationship '{name}' ({relationship_id}) is protected and cannot be deleted")]
    ProtectedRelationship {
        relationship_id: String,
        name: String,
    },

    // ===== Illegal state =====
    #[error("Expected inverse of {origin_id} on entity type {target_key} is missing during {op}")]
    InverseMissing {
        origin_id: String,
        target_key: String,
        op: String,
    },

    // ===== Authorization =====
    #[error("Actor {actor} may not {action} in workspace {workspace_id}")]
    Forbidden {
        actor: String,
        workspace_id: String,
        action: String,
    },

    // ===== Integration =====
    #[error("Persistence failure: {reason}")]
    Persistence { reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl TypeGraphError {
    /// Classification of this error in the canonical taxonomy
    pub fn kind(&self) -> ExErrorKind {
        use TypeGraphError::*;
        match self {
            DuplicateRelationshipName { .. }
            | MissingInverseName { .. }
            | MissingBidirectionalTargets { .. }
            | MissingTargetTypes { .. }
            | BidirectionalTargetNotAllowed { .. }
            | MissingInverseReference { .. }
            | DuplicateInverseReference { .. }
            | MissingOriginId { .. }
            | ReferenceMismatch { .. }
            | OrphanedReference { .. }
            | ReferenceStillLinked { .. }
            | RelationshipKindChanged { .. }
            | InvalidRelationship { .. }
            | InvalidConfig { .. } => ExErrorKind::Validation,

            EntityTypeNotFound { .. }
            | EntityTypeIdNotFound { .. }
            | EntityTypeDeleted { .. }
            | EntityTypeNotResolved { .. }
            | RelationshipNotFound { .. }
            | OriginRelationshipNotFound { .. } => ExErrorKind::NotFound,

            ProtectedRelationship { .. } => ExErrorKind::Protected,
            InverseMissing { .. } => ExErrorKind::IllegalState,
            Forbidden { .. } => ExErrorKind::Forbidden,
            Persistence { .. } => ExErrorKind::Persistence,
            Serialization { .. } => ExErrorKind::Serialization,
        }
    }

    /// Entity type the error is about, when it names one
    pub fn entity_type_key(&self) -> Option<&str> {
        use TypeGraphError::*;
        match self {
            DuplicateRelationshipName {
                entity_type_key, ..
            }
            | OrphanedReference {
                entity_type_key, ..
            }
            | ReferenceStillLinked {
                entity_type_key, ..
            }
            | RelationshipNotFound {
                entity_type_key, ..
            } => Some(entity_type_key.as_str()),
            BidirectionalTargetNotAllowed { target_key, .. }
            | MissingInverseReference { target_key, .. }
            | DuplicateInverseReference { target_key, .. }
            | InverseMissing { target_key, .. } => Some(target_key.as_str()),
            EntityTypeNotFound { key, .. }
            | EntityTypeDeleted { key }
            | EntityTypeNotResolved { key } => Some(key.as_str()),
            _ => None,
        }
    }

    /// Relationship the error is about, when it names one
    pub fn relationship_id(&self) -> Option<&str> {
        use TypeGraphError::*;
        match self {
            MissingInverseName {
                relationship_id, ..
            }
            | MissingBidirectionalTargets {
                relationship_id, ..
            }
            | MissingTargetTypes {
                relationship_id, ..
            }
            | BidirectionalTargetNotAllowed {
                relationship_id, ..
            }
            | MissingInverseReference {
                relationship_id, ..
            }
            | DuplicateInverseReference {
                relationship_id, ..
            }
            | MissingOriginId {
                relationship_id, ..
            }
            | ReferenceMismatch {
                relationship_id, ..
            }
            | RelationshipKindChanged { relationship_id }
            | InvalidRelationship {
                relationship_id, ..
            }
            | RelationshipNotFound {
                relationship_id, ..
            }
            | ProtectedRelationship {
                relationship_id, ..
            } => Some(relationship_id.as_str()),
            OrphanedReference { origin_id, .. }
            | InverseMissing { origin_id, .. }
            | OriginRelationshipNotFound { origin_id, .. } => Some(origin_id.as_str()),
            ReferenceStillLinked { reference_id, .. } => Some(reference_id.as_str()),
            _ => None,
        }
    }
}

impl From<TypeGraphError> for ExError {
    fn from(err: TypeGraphError) -> Self {
        let mut ex = ExError::new(err.kind()).with_message(err.to_string());
        if let Some(key) = err.entity_type_key() {
            ex = ex.with_entity_type_key(key);
        }
        if let Some(id) = err.relationship_id() {
            ex = ex.with_relationship_id(id);
        }
        ex
    }
}

impl From<&TypeGraphError> for ExError {
    fn from(err: &TypeGraphError) -> Self {
        err.clone().into()
    }
}

impl From<serde_json::Error> for TypeGraphError {
    fn from(err: serde_json::Error) -> Self {
        TypeGraphError::Serialization {
            message: err.to_string(),
        }
    }
}
