//! Repository layer for persisting entity types to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteEntityTypeStore;
