//! Collaborators notified after a relationship batch commits
//!
//! Both hooks are best-effort: the mutator logs their failures and never
//! rolls back a committed batch because of them.

use std::collections::BTreeMap;

use crate::errors::Result;

/// What kind of schema element semantic metadata is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Relationship,
}

/// Owner of per-relationship semantic metadata
pub trait SemanticMetadataHook: Send + Sync {
    /// Called once per newly added relationship
    ///
    /// # Errors
    ///
    /// Implementation-defined; the caller only logs them.
    fn initialize_for_target(
        &self,
        entity_type_id: &str,
        workspace_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<()>;

    /// Called once per removed relationship
    ///
    /// # Errors
    ///
    /// Implementation-defined; the caller only logs them.
    fn delete_for_target(
        &self,
        entity_type_id: &str,
        target_type: TargetType,
        target_id: &str,
    ) -> Result<()>;
}

/// Audit category of a relationship change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    /// A user-declared ORIGIN relationship
    Relationship,
    /// A synthesized REFERENCE relationship
    InverseRelationship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

/// Audit trail sink
pub trait ActivitySink: Send + Sync {
    /// # Errors
    ///
    /// Implementation-defined; the caller only logs them.
    fn log(
        &self,
        activity: Activity,
        operation: OperationType,
        actor: &str,
        workspace_id: &str,
        entity_id: &str,
        details: &BTreeMap<String, String>,
    ) -> Result<()>;
}

/// Discards every notification (default for the mutator)
pub struct NoopSemanticMetadataHook;

impl SemanticMetadataHook for NoopSemanticMetadataHook {
    fn initialize_for_target(&self, _: &str, _: &str, _: TargetType, _: &str) -> Result<()> {
        Ok(())
    }

    fn delete_for_target(&self, _: &str, _: TargetType, _: &str) -> Result<()> {
        Ok(())
    }
}

/// Discards every activity (default for the mutator)
pub struct NoopActivitySink;

impl ActivitySink for NoopActivitySink {
    fn log(
        &self,
        _: Activity,
        _: OperationType,
        _: &str,
        _: &str,
        _: &str,
        _: &BTreeMap<String, String>,
    ) -> Result<()> {
        Ok(())
    }
}
