//! TypeGraph Core - relationship consistency engine for dynamic entity types
//!
//! This crate keeps bidirectional relationship definitions between entity
//! types consistent, including:
//! - ORIGIN/REFERENCE relationship models and entity types
//! - Inverse synthesis, renaming, cardinality propagation and cascade removal
//! - Relationship diffing with change flags
//! - Working-set validation before a single atomic save
//! - A policy-checked command boundary and best-effort collaborator hooks
//!
//! Persistence is behind the `EntityTypeStore` trait; an in-memory store
//! ships here and a SQLite store lives in `typegraph-store`.

pub mod apply;
pub mod commands;
pub mod config;
pub mod context;
pub mod diff;
pub mod errors;
pub mod hooks;
pub mod logging_facility;
pub mod model;
pub mod ops;
pub mod policy;
pub mod rules;

// Re-export commonly used types
pub use apply::apply;
pub use commands::Command;
pub use config::MutatorConfig;
pub use context::MutationContext;
pub use diff::{diff, ChangeFlag, RelationshipDiff, RelationshipModification};
pub use errors::{ExError, ExErrorKind, Result, TypeGraphError};
pub use model::{Cardinality, EntityType, RelationshipDefinition, RelationshipKind};
pub use ops::{
    DeleteAction, DeleteRequest, EntityTypeStore, InMemoryEntityTypeStore, RelationshipMutator,
    WorkingSet,
};
pub use policy::{AllowAllPolicy, DenyAllPolicy, SchemaAccessPolicy, WorkspaceMembershipPolicy};
