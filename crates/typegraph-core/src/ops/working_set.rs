use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::store::EntityTypeStore;
use crate::errors::{Result, TypeGraphError};
use crate::model::{EntityType, RelationshipDefinition};

/// What happened to a relationship inside one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalChange {
    Added,
    Removed,
    Modified,
}

/// One relationship mutation recorded by the working set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub change: JournalChange,
    pub entity_type_id: String,
    pub entity_type_key: String,
    pub relationship_id: String,
    pub relationship_name: String,
    /// True for a synthesized REFERENCE
    pub is_reference: bool,
}

/// Request-scoped, lazily grown map of the entity types one operation touches
///
/// Lookups resolve from the map first and fall back to the loader, caching
/// the loaded entity type for the rest of the operation. Nothing in here is
/// persisted until the owning mutator hands the whole set to `save_all`.
#[derive(Debug, Clone)]
pub struct WorkingSet {
    workspace_id: String,
    types: BTreeMap<String, EntityType>,
    journal: Vec<JournalEntry>,
}

impl WorkingSet {
    pub fn new(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            types: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Build a working set over already-resolved entity types
    pub fn from_types(
        workspace_id: impl Into<String>,
        types: impl IntoIterator<Item = EntityType>,
    ) -> Self {
        let mut ws = Self::new(workspace_id);
        for et in types {
            ws.types.insert(et.key.clone(), et);
        }
        ws
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// Load every key not yet present in one batch
    ///
    /// # Errors
    ///
    /// `EntityTypeNotFound` naming the first (in key order) key the store
    /// does not know.
    pub fn preload(&mut self, keys: BTreeSet<String>, loader: &dyn EntityTypeStore) -> Result<()> {
        let missing: Vec<String> = keys
            .into_iter()
            .filter(|k| !self.types.contains_key(k))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        for et in loader.find_by_keys(&self.workspace_id, &missing)? {
            self.types.insert(et.key.clone(), et);
        }

        if let Some(absent) = missing.iter().find(|k| !self.types.contains_key(*k)) {
            return Err(TypeGraphError::EntityTypeNotFound {
                workspace_id: self.workspace_id.clone(),
                key: absent.clone(),
            });
        }

        debug!(
            workspace_id = %self.workspace_id,
            loaded = missing.len(),
            working_set_len = self.types.len(),
            "preloaded entity types"
        );
        Ok(())
    }

    /// Entity type by key, loading and caching it on first use
    ///
    /// # Errors
    ///
    /// Whatever the loader returns for an unknown or deleted key.
    pub fn resolve(&mut self, key: &str, loader: &dyn EntityTypeStore) -> Result<&mut EntityType> {
        if !self.types.contains_key(key) {
            let et = loader.find_by_key(&self.workspace_id, key)?;
            debug!(workspace_id = %self.workspace_id, entity_type_key = key, "loaded entity type into working set");
            self.types.insert(key.to_string(), et);
        }

        self.types
            .get_mut(key)
            .ok_or_else(|| TypeGraphError::EntityTypeNotFound {
                workspace_id: self.workspace_id.clone(),
                key: key.to_string(),
            })
    }

    pub fn get(&self, key: &str) -> Option<&EntityType> {
        self.types.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut EntityType> {
        self.types.get_mut(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn types(&self) -> &BTreeMap<String, EntityType> {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Locate a relationship by id anywhere in the working set
    pub fn find_relationship(&self, id: &str) -> Option<&RelationshipDefinition> {
        self.types.values().find_map(|t| t.relationship(id))
    }

    /// Key of the entity type declaring relationship `id`
    pub fn owner_of(&self, id: &str) -> Option<&str> {
        self.types
            .values()
            .find(|t| t.relationship(id).is_some())
            .map(|t| t.key.as_str())
    }

    /// Record a relationship mutation on entity type `key`
    pub fn record(&mut self, change: JournalChange, key: &str, relationship: &RelationshipDefinition) {
        let entity_type_id = self
            .types
            .get(key)
            .map(|t| t.id.clone())
            .unwrap_or_default();
        self.journal.push(JournalEntry {
            change,
            entity_type_id,
            entity_type_key: key.to_string(),
            relationship_id: relationship.id.clone(),
            relationship_name: relationship.name.clone(),
            is_reference: relationship.is_reference(),
        });
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Split into the batch to persist and the mutation journal
    pub fn into_parts(self) -> (Vec<EntityType>, Vec<JournalEntry>) {
        (self.types.into_values().collect(), self.journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::store::InMemoryEntityTypeStore;

    fn store_with(keys: &[&str]) -> InMemoryEntityTypeStore {
        let mut store = InMemoryEntityTypeStore::new();
        for (i, key) in keys.iter().enumerate() {
            store.insert(EntityType::new(
                format!("et-{}", i),
                "ws-1".to_string(),
                key.to_string(),
            ));
        }
        store
    }

    #[test]
    fn test_resolve_caches_loaded_type() {
        let store = store_with(&["Employee"]);
        let mut ws = WorkingSet::new("ws-1");

        ws.resolve("Employee", &store).unwrap().display_name = "Staff".to_string();

        // Second resolve returns the cached, mutated copy rather than reloading
        assert_eq!(ws.resolve("Employee", &store).unwrap().display_name, "Staff");
        assert_eq!(store.get("ws-1", "Employee").unwrap().display_name, "Employee");
    }

    #[test]
    fn test_preload_reports_missing_key() {
        let store = store_with(&["Employee"]);
        let mut ws = WorkingSet::new("ws-1");

        let keys = BTreeSet::from(["Employee".to_string(), "Invoice".to_string()]);
        let err = ws.preload(keys, &store).unwrap_err();

        assert!(matches!(
            err,
            TypeGraphError::EntityTypeNotFound { ref key, .. } if key == "Invoice"
        ));
    }

    #[test]
    fn test_preload_does_not_reload_cached_types() {
        let store = store_with(&["Employee", "Department"]);
        let mut ws = WorkingSet::new("ws-1");
        ws.resolve("Employee", &store).unwrap().display_name = "Staff".to_string();

        let keys = BTreeSet::from(["Employee".to_string(), "Department".to_string()]);
        ws.preload(keys, &store).unwrap();

        assert_eq!(ws.len(), 2);
        assert_eq!(ws.get("Employee").unwrap().display_name, "Staff");
    }

    #[test]
    fn test_record_captures_entity_type_id() {
        let store = store_with(&["Employee"]);
        let mut ws = WorkingSet::new("ws-1");
        ws.resolve("Employee", &store).unwrap();

        let rel = RelationshipDefinition::origin(
            "r1",
            "Manager",
            "Employee",
            crate::model::Cardinality::ManyToOne,
            ["Employee"],
        );
        ws.record(JournalChange::Added, "Employee", &rel);

        let (types, journal) = ws.into_parts();
        assert_eq!(types.len(), 1);
        assert_eq!(journal[0].entity_type_id, "et-0");
        assert_eq!(journal[0].relationship_name, "Manager");
    }
}
