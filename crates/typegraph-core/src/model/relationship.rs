use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Cardinality of a relationship, read from the declaring entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Cardinality {
    /// The same edge read from the other end
    pub fn invert(self) -> Self {
        match self {
            Cardinality::OneToOne => Cardinality::OneToOne,
            Cardinality::OneToMany => Cardinality::ManyToOne,
            Cardinality::ManyToOne => Cardinality::OneToMany,
            Cardinality::ManyToMany => Cardinality::ManyToMany,
        }
    }
}

/// Role-specific half of a relationship definition
///
/// An ORIGIN owns the edge: its target set, cardinality and inverse
/// configuration are authoritative. A REFERENCE is the synthesized mirror
/// stored on a target entity type and points back at its ORIGIN by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "relationship_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    Origin {
        /// Default name of the synthesized REFERENCE on each target
        inverse_name: Option<String>,
        bidirectional: bool,
        /// Targets that currently carry a synthesized REFERENCE
        bidirectional_entity_type_keys: Option<BTreeSet<String>>,
    },
    Reference {
        origin_relationship_id: Option<String>,
    },
}

/// A relationship declared directly on one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDefinition {
    /// Stable across edits; the join key between ORIGIN and REFERENCE
    pub id: String,
    pub name: String,
    pub source_entity_type_key: String,
    pub cardinality: Cardinality,
    /// Allowed targets. `None` only when `allow_polymorphic` is set.
    pub entity_type_keys: Option<BTreeSet<String>>,
    pub allow_polymorphic: bool,
    /// System-managed; cannot be deleted through the mutator
    pub protected: bool,
    pub required: bool,
    #[serde(flatten)]
    pub kind: RelationshipKind,
}

impl RelationshipDefinition {
    /// Create a unidirectional ORIGIN relationship
    pub fn origin(
        id: impl Into<String>,
        name: impl Into<String>,
        source_entity_type_key: impl Into<String>,
        cardinality: Cardinality,
        entity_type_keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_entity_type_key: source_entity_type_key.into(),
            cardinality,
            entity_type_keys: Some(entity_type_keys.into_iter().map(Into::into).collect()),
            allow_polymorphic: false,
            protected: false,
            required: false,
            kind: RelationshipKind::Origin {
                inverse_name: None,
                bidirectional: false,
                bidirectional_entity_type_keys: None,
            },
        }
    }

    /// Create a REFERENCE relationship pointing at `origin_relationship_id`
    pub fn reference(
        id: impl Into<String>,
        name: impl Into<String>,
        source_entity_type_key: impl Into<String>,
        cardinality: Cardinality,
        origin_source_key: impl Into<String>,
        origin_relationship_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source_entity_type_key: source_entity_type_key.into(),
            cardinality,
            entity_type_keys: Some(BTreeSet::from([origin_source_key.into()])),
            allow_polymorphic: false,
            protected: false,
            required: false,
            kind: RelationshipKind::Reference {
                origin_relationship_id: Some(origin_relationship_id.into()),
            },
        }
    }

    /// Make an ORIGIN bidirectional towards `targets`
    ///
    /// No-op on a REFERENCE.
    pub fn with_bidirectional(
        mut self,
        inverse_name: impl Into<String>,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        if let RelationshipKind::Origin {
            inverse_name: ref mut name,
            ref mut bidirectional,
            ref mut bidirectional_entity_type_keys,
        } = self.kind
        {
            *name = Some(inverse_name.into());
            *bidirectional = true;
            *bidirectional_entity_type_keys = Some(targets.into_iter().map(Into::into).collect());
        }
        self
    }

    /// Allow any entity type as a target
    pub fn polymorphic(mut self) -> Self {
        self.allow_polymorphic = true;
        self.entity_type_keys = None;
        self
    }

    pub fn with_protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    pub fn is_origin(&self) -> bool {
        matches!(self.kind, RelationshipKind::Origin { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, RelationshipKind::Reference { .. })
    }

    /// True for an ORIGIN with `bidirectional` set
    pub fn is_bidirectional_origin(&self) -> bool {
        matches!(
            self.kind,
            RelationshipKind::Origin {
                bidirectional: true,
                ..
            }
        )
    }

    pub fn inverse_name(&self) -> Option<&str> {
        match &self.kind {
            RelationshipKind::Origin { inverse_name, .. } => inverse_name.as_deref(),
            RelationshipKind::Reference { .. } => None,
        }
    }

    pub fn origin_relationship_id(&self) -> Option<&str> {
        match &self.kind {
            RelationshipKind::Reference {
                origin_relationship_id,
            } => origin_relationship_id.as_deref(),
            RelationshipKind::Origin { .. } => None,
        }
    }

    /// Bidirectional targets of an ORIGIN; empty for a REFERENCE or when unset
    pub fn bidirectional_targets(&self) -> BTreeSet<String> {
        match &self.kind {
            RelationshipKind::Origin {
                bidirectional_entity_type_keys: Some(keys),
                ..
            } => keys.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Declared targets; empty when polymorphic
    pub fn target_keys(&self) -> BTreeSet<String> {
        self.entity_type_keys.clone().unwrap_or_default()
    }

    /// Every entity type key this definition mentions
    pub fn referenced_keys(&self) -> BTreeSet<String> {
        let mut keys = self.target_keys();
        keys.extend(self.bidirectional_targets());
        keys.insert(self.source_entity_type_key.clone());
        keys
    }

    pub(crate) fn bidirectional_targets_mut(&mut self) -> Option<&mut BTreeSet<String>> {
        match &mut self.kind {
            RelationshipKind::Origin {
                bidirectional_entity_type_keys,
                ..
            } => Some(bidirectional_entity_type_keys.get_or_insert_with(BTreeSet::new)),
            RelationshipKind::Reference { .. } => None,
        }
    }

    /// Same variant, ignoring payload
    pub fn same_kind(&self, other: &RelationshipDefinition) -> bool {
        self.is_origin() == other.is_origin()
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            RelationshipKind::Origin { .. } => "ORIGIN",
            RelationshipKind::Reference { .. } => "REFERENCE",
        }
    }
}
