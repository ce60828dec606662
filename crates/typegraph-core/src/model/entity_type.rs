use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::relationship::RelationshipDefinition;

/// What a display-order entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnKind {
    Attribute,
    Relationship,
}

/// One entry in an entity type's display ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub kind: ColumnKind,
    pub id: String,
}

impl ColumnEntry {
    pub fn relationship(id: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Relationship,
            id: id.into(),
        }
    }

    pub fn attribute(id: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Attribute,
            id: id.into(),
        }
    }
}

/// A dynamically-defined entity type within one workspace
///
/// Identity for lookups is `(workspace_id, key)` or `id`. Relationship
/// records are mutated in place; there is no versioning at this level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityType {
    pub id: String,
    pub workspace_id: String,
    /// Unique within the workspace
    pub key: String,
    pub display_name: String,
    /// Attribute definitions; opaque to the relationship engine
    #[serde(default)]
    pub schema: serde_json::Value,
    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
    #[serde(default)]
    pub protected: bool,
    /// Tombstone flag; deleted types are invisible to store lookups
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityType {
    pub fn new(id: String, workspace_id: String, key: String) -> Self {
        let now = Utc::now();
        Self {
            display_name: key.clone(),
            id,
            workspace_id,
            key,
            schema: serde_json::Value::Null,
            relationships: Vec::new(),
            columns: Vec::new(),
            protected: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn relationship(&self, id: &str) -> Option<&RelationshipDefinition> {
        self.relationships.iter().find(|r| r.id == id)
    }

    pub fn relationship_mut(&mut self, id: &str) -> Option<&mut RelationshipDefinition> {
        self.relationships.iter_mut().find(|r| r.id == id)
    }

    /// The REFERENCE on this type mirroring `origin_id`, if any
    pub fn reference_for_origin(&self, origin_id: &str) -> Option<&RelationshipDefinition> {
        self.relationships
            .iter()
            .find(|r| r.origin_relationship_id() == Some(origin_id))
    }

    /// Every REFERENCE on this type mirroring `origin_id`
    pub fn references_for_origin<'a>(
        &'a self,
        origin_id: &'a str,
    ) -> impl Iterator<Item = &'a RelationshipDefinition> + 'a {
        self.relationships
            .iter()
            .filter(move |r| r.origin_relationship_id() == Some(origin_id))
    }

    /// Whether `name` is taken by a relationship other than `except_id`
    pub fn is_name_taken(&self, name: &str, except_id: Option<&str>) -> bool {
        self.relationships
            .iter()
            .any(|r| r.name == name && Some(r.id.as_str()) != except_id)
    }

    /// Insert or overwrite a relationship by id
    ///
    /// A new relationship is appended to both `relationships` and the
    /// display ordering. Returns `true` when the relationship was new.
    pub fn upsert_relationship(&mut self, relationship: RelationshipDefinition) -> bool {
        self.updated_at = Utc::now();
        if let Some(existing) = self.relationship_mut(&relationship.id) {
            *existing = relationship;
            return false;
        }

        let column = ColumnEntry::relationship(relationship.id.clone());
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self.relationships.push(relationship);
        true
    }

    /// Remove a relationship and its display-order entry
    pub fn remove_relationship(&mut self, id: &str) -> Option<RelationshipDefinition> {
        let position = self.relationships.iter().position(|r| r.id == id)?;
        let removed = self.relationships.remove(position);
        self.columns
            .retain(|c| !(c.kind == ColumnKind::Relationship && c.id == id));
        self.updated_at = Utc::now();
        Some(removed)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
