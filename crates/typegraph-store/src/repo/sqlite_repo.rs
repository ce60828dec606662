//! SQLite-backed `EntityTypeStore`
//!
//! Each entity type is one row: the scalar columns carry the lookup keys and
//! `body` holds the full JSON form, relationships included.

#![allow(clippy::result_large_err)]

use std::path::Path;

use rusqlite::{params_from_iter, Connection, OptionalExtension, Transaction};
use tracing::debug;
use typegraph_core::errors::TypeGraphError;
use typegraph_core::model::EntityType;
use typegraph_core::ops::EntityTypeStore;

use crate::db;
use crate::errors::{persistence, Result};
use crate::migrations::apply_migrations;

type StoreResult<T> = typegraph_core::Result<T>;

/// Entity type storage over one SQLite connection
pub struct SqliteEntityTypeStore {
    conn: Connection,
}

impl SqliteEntityTypeStore {
    /// Wrap a connection that already has the schema applied
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (or create) a database file, configure it and apply migrations
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    /// Fresh in-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or overwrite a single entity type
    pub fn insert(&mut self, entity_type: &EntityType) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| persistence("insert", e))?;
        upsert_tx(&tx, entity_type)?;
        tx.commit().map_err(|e| persistence("insert", e))
    }

    /// Every live entity type in a workspace, ordered by key
    pub fn list(&self, workspace_id: &str) -> StoreResult<Vec<EntityType>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT body FROM entity_types
                 WHERE workspace_id = ?1 AND deleted = 0
                 ORDER BY key",
            )
            .map_err(|e| persistence("list", e))?;
        let bodies = stmt
            .query_map([workspace_id], |row| row.get::<_, String>(0))
            .map_err(|e| persistence("list", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| persistence("list", e))?;

        bodies.iter().map(|b| decode(b)).collect()
    }

    fn row_by_key(&self, workspace_id: &str, key: &str) -> StoreResult<Option<(String, bool)>> {
        self.conn
            .query_row(
                "SELECT body, deleted FROM entity_types WHERE workspace_id = ?1 AND key = ?2",
                [workspace_id, key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0)),
            )
            .optional()
            .map_err(|e| persistence("find_by_key", e))
    }
}

impl EntityTypeStore for SqliteEntityTypeStore {
    fn find_by_key(&self, workspace_id: &str, key: &str) -> StoreResult<EntityType> {
        match self.row_by_key(workspace_id, key)? {
            None => Err(TypeGraphError::EntityTypeNotFound {
                workspace_id: workspace_id.to_string(),
                key: key.to_string(),
            }),
            Some((_, true)) => Err(TypeGraphError::EntityTypeDeleted {
                key: key.to_string(),
            }),
            Some((body, false)) => decode(&body),
        }
    }

    fn find_by_keys(&self, workspace_id: &str, keys: &[String]) -> StoreResult<Vec<EntityType>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (0..keys.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT body FROM entity_types
             WHERE workspace_id = ?1 AND deleted = 0 AND key IN ({})
             ORDER BY key",
            placeholders
        );

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| persistence("find_by_keys", e))?;
        let params = std::iter::once(workspace_id).chain(keys.iter().map(String::as_str));
        let bodies = stmt
            .query_map(params_from_iter(params), |row| row.get::<_, String>(0))
            .map_err(|e| persistence("find_by_keys", e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| persistence("find_by_keys", e))?;

        bodies.iter().map(|b| decode(b)).collect()
    }

    fn find_by_id(&self, id: &str) -> StoreResult<EntityType> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM entity_types WHERE id = ?1 AND deleted = 0",
                [id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| persistence("find_by_id", e))?;

        match body {
            Some(body) => decode(&body),
            None => Err(TypeGraphError::EntityTypeIdNotFound { id: id.to_string() }),
        }
    }

    /// Upsert every entity type in one transaction
    ///
    /// A `(workspace_id, key)` collision under a different id violates the
    /// unique index and rolls the whole batch back.
    fn save_all(&mut self, entity_types: Vec<EntityType>) -> StoreResult<Vec<EntityType>> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| persistence("save_all", e))?;
        for entity_type in &entity_types {
            upsert_tx(&tx, entity_type)?;
        }
        tx.commit().map_err(|e| persistence("save_all", e))?;

        debug!(saved = entity_types.len(), "saved entity types");
        Ok(entity_types)
    }
}

fn upsert_tx(tx: &Transaction, entity_type: &EntityType) -> StoreResult<()> {
    let body = serde_json::to_string(entity_type)?;
    tx.execute(
        "INSERT INTO entity_types (id, workspace_id, key, deleted, body, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            workspace_id = excluded.workspace_id,
            key = excluded.key,
            deleted = excluded.deleted,
            body = excluded.body,
            updated_at = excluded.updated_at",
        rusqlite::params![
            entity_type.id,
            entity_type.workspace_id,
            entity_type.key,
            if entity_type.deleted { 1 } else { 0 },
            body,
            entity_type.created_at.timestamp(),
            entity_type.updated_at.timestamp(),
        ],
    )
    .map_err(|e| persistence("save_all", e))?;
    Ok(())
}

fn decode(body: &str) -> StoreResult<EntityType> {
    Ok(serde_json::from_str(body)?)
}
