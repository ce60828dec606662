use std::collections::{HashMap, HashSet};

use crate::errors::{Result, TypeGraphError};
use crate::model::EntityType;

/// Persistence collaborator for entity types
///
/// Lookups are scoped to a workspace. `save_all` must be atomic: either
/// every entity type in the batch is written or none is. Concurrency control
/// between overlapping batches is the store's responsibility.
pub trait EntityTypeStore {
    /// # Errors
    ///
    /// `EntityTypeNotFound` if no live entity type has this key, or
    /// `EntityTypeDeleted` if it exists but was tombstoned.
    fn find_by_key(&self, workspace_id: &str, key: &str) -> Result<EntityType>;

    /// Live entity types matching `keys`; missing keys are simply absent
    ///
    /// # Errors
    ///
    /// Only on backend failure.
    fn find_by_keys(&self, workspace_id: &str, keys: &[String]) -> Result<Vec<EntityType>>;

    /// # Errors
    ///
    /// `EntityTypeIdNotFound` if no live entity type has this id.
    fn find_by_id(&self, id: &str) -> Result<EntityType>;

    /// # Errors
    ///
    /// `Persistence` if the batch cannot be written; nothing is written then.
    fn save_all(&mut self, entity_types: Vec<EntityType>) -> Result<Vec<EntityType>>;
}

/// HashMap-backed entity type store
///
/// Single-threaded reference implementation used by tests and by callers
/// that hydrate a snapshot into memory. Not thread-safe.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityTypeStore {
    /// Entity types by id
    pub(crate) types: HashMap<String, EntityType>,
    save_calls: usize,
}

impl InMemoryEntityTypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity type, bypassing `save_all`
    ///
    /// Test setup and hydration only.
    pub fn insert(&mut self, entity_type: EntityType) {
        self.types.insert(entity_type.id.clone(), entity_type);
    }

    /// Live entity type by key, borrowed
    pub fn get(&self, workspace_id: &str, key: &str) -> Option<&EntityType> {
        self.types
            .values()
            .find(|t| t.workspace_id == workspace_id && t.key == key && !t.deleted)
    }

    /// Every live entity type in a workspace, ordered by key
    pub fn list(&self, workspace_id: &str) -> Vec<&EntityType> {
        let mut types: Vec<&EntityType> = self
            .types
            .values()
            .filter(|t| t.workspace_id == workspace_id && !t.deleted)
            .collect();
        types.sort_by(|a, b| a.key.cmp(&b.key));
        types
    }

    /// Number of successful `save_all` calls so far
    pub fn save_calls(&self) -> usize {
        self.save_calls
    }

    fn find_any_by_key(&self, workspace_id: &str, key: &str) -> Option<&EntityType> {
        self.types
            .values()
            .find(|t| t.workspace_id == workspace_id && t.key == key)
    }
}

impl EntityTypeStore for InMemoryEntityTypeStore {
    fn find_by_key(&self, workspace_id: &str, key: &str) -> Result<EntityType> {
        let entity_type = self.find_any_by_key(workspace_id, key).ok_or_else(|| {
            TypeGraphError::EntityTypeNotFound {
                workspace_id: workspace_id.to_string(),
                key: key.to_string(),
            }
        })?;

        if entity_type.deleted {
            return Err(TypeGraphError::EntityTypeDeleted {
                key: key.to_string(),
            });
        }

        Ok(entity_type.clone())
    }

    fn find_by_keys(&self, workspace_id: &str, keys: &[String]) -> Result<Vec<EntityType>> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let mut found: Vec<EntityType> = self
            .types
            .values()
            .filter(|t| {
                t.workspace_id == workspace_id && !t.deleted && wanted.contains(t.key.as_str())
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    fn find_by_id(&self, id: &str) -> Result<EntityType> {
        self.types
            .get(id)
            .filter(|t| !t.deleted)
            .cloned()
            .ok_or_else(|| TypeGraphError::EntityTypeIdNotFound { id: id.to_string() })
    }

    fn save_all(&mut self, entity_types: Vec<EntityType>) -> Result<Vec<EntityType>> {
        // Check the whole batch before writing any of it
        for et in &entity_types {
            if let Some(existing) = self.find_any_by_key(&et.workspace_id, &et.key) {
                if existing.id != et.id {
                    return Err(TypeGraphError::Persistence {
                        reason: format!(
                            "entity type key {} already belongs to {} in workspace {}",
                            et.key, existing.id, et.workspace_id
                        ),
                    });
                }
            }
        }

        for et in &entity_types {
            self.types.insert(et.id.clone(), et.clone());
        }
        self.save_calls += 1;
        Ok(entity_types)
    }
}
