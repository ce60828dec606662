//! Error handling for typegraph-store
//!
//! Connection and migration helpers report `ExError`; the
//! `EntityTypeStore` implementation reports `TypeGraphError` so the mutator
//! can propagate it unchanged.

use typegraph_core::errors::{ExError, ExErrorKind, TypeGraphError};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::IllegalState)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Wrap a rusqlite::Error raised inside an `EntityTypeStore` call
pub fn persistence(op: &str, err: rusqlite::Error) -> TypeGraphError {
    TypeGraphError::Persistence {
        reason: format!("{}: {}", op, err),
    }
}
