//! Schema access policy trait and implementations
//!
//! This module defines the `SchemaAccessPolicy` trait, which decides whether
//! an actor may change relationship definitions in a workspace. The policy
//! is injected into the `apply()` function and consulted before any entity
//! type is loaded.

use std::collections::{BTreeMap, BTreeSet};

use crate::context::MutationContext;
use crate::errors::{Result, TypeGraphError};

/// Schema change being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaAction {
    CreateRelationships,
    RemoveRelationships,
    UpdateRelationships,
}

impl SchemaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaAction::CreateRelationships => "create_relationships",
            SchemaAction::RemoveRelationships => "remove_relationships",
            SchemaAction::UpdateRelationships => "update_relationships",
        }
    }
}

/// Authorization check run before a command reaches the mutator
pub trait SchemaAccessPolicy: Send + Sync {
    /// # Errors
    ///
    /// `Forbidden` if the actor in `ctx` may not perform `action`.
    fn authorize(&self, ctx: &MutationContext, action: SchemaAction) -> Result<()>;
}

fn forbidden(ctx: &MutationContext, action: SchemaAction) -> TypeGraphError {
    TypeGraphError::Forbidden {
        actor: ctx.actor.clone(),
        workspace_id: ctx.workspace_id.clone(),
        action: action.as_str().to_string(),
    }
}

/// Allows everything (for embedding services that authorize upstream, and tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

impl SchemaAccessPolicy for AllowAllPolicy {
    fn authorize(&self, _: &MutationContext, _: SchemaAction) -> Result<()> {
        Ok(())
    }
}

/// Denies everything (for tests that verify a denial stops all writes)
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllPolicy;

impl SchemaAccessPolicy for DenyAllPolicy {
    fn authorize(&self, ctx: &MutationContext, action: SchemaAction) -> Result<()> {
        Err(forbidden(ctx, action))
    }
}

/// Allows an actor to change schemas only in workspaces it is a member of
///
/// # Example
/// ```
/// use typegraph_core::context::MutationContext;
/// use typegraph_core::policy::{SchemaAccessPolicy, SchemaAction, WorkspaceMembershipPolicy};
///
/// let policy = WorkspaceMembershipPolicy::new().with_member("alice", "ws-1");
///
/// let ctx = MutationContext::new("ws-1", "alice");
/// assert!(policy.authorize(&ctx, SchemaAction::CreateRelationships).is_ok());
///
/// let ctx = MutationContext::new("ws-2", "alice");
/// assert!(policy.authorize(&ctx, SchemaAction::CreateRelationships).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorkspaceMembershipPolicy {
    members: BTreeMap<String, BTreeSet<String>>,
}

impl WorkspaceMembershipPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(mut self, actor: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        self.members
            .entry(actor.into())
            .or_default()
            .insert(workspace_id.into());
        self
    }

    pub fn is_member(&self, actor: &str, workspace_id: &str) -> bool {
        self.members
            .get(actor)
            .is_some_and(|workspaces| workspaces.contains(workspace_id))
    }
}

impl SchemaAccessPolicy for WorkspaceMembershipPolicy {
    fn authorize(&self, ctx: &MutationContext, action: SchemaAction) -> Result<()> {
        if self.is_member(&ctx.actor, &ctx.workspace_id) {
            Ok(())
        } else {
            Err(forbidden(ctx, action))
        }
    }
}
