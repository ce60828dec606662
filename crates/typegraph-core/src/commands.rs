//! Command types for relationship schema changes
//!
//! Commands are the entry point for policy-checked mutations via the
//! `apply()` function.

use crate::diff::RelationshipDiff;
use crate::model::RelationshipDefinition;
use crate::ops::DeleteRequest;
use crate::policy::SchemaAction;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Attach definitions to their source entity types, keyed by source key
    CreateRelationships {
        definitions: Vec<(String, RelationshipDefinition)>,
    },

    /// Remove relationships with a per-request delete action
    RemoveRelationships { requests: Vec<DeleteRequest> },

    /// Reconcile stored relationships with a computed diff
    UpdateRelationships { diff: RelationshipDiff },
}

impl Command {
    /// The action a policy must allow for this command
    pub fn action(&self) -> SchemaAction {
        match self {
            Command::CreateRelationships { .. } => SchemaAction::CreateRelationships,
            Command::RemoveRelationships { .. } => SchemaAction::RemoveRelationships,
            Command::UpdateRelationships { .. } => SchemaAction::UpdateRelationships,
        }
    }
}
