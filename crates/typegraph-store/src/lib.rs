//! TypeGraph Store - SQLite persistence for entity types
//!
//! Provides:
//! - SQLite schema with a checksummed migrations framework
//! - `SqliteEntityTypeStore`, an `EntityTypeStore` that saves each batch in
//!   one transaction

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteEntityTypeStore;
