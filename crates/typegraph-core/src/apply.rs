//! Policy-checked command boundary
//!
//! `apply()` is the canonical entry point for callers that hold a
//! `Command` rather than calling the mutator directly.
//!
//! ## Contract
//!
//! - **Authorize first**: the policy runs before any entity type is loaded;
//!   a denied command performs no load and no save
//! - **All-or-nothing**: on success every touched entity type was saved in
//!   one batch; on error nothing was saved
//!
//! ## Example
//!
//! ```
//! use typegraph_core::apply::apply;
//! use typegraph_core::commands::Command;
//! use typegraph_core::context::MutationContext;
//! use typegraph_core::model::{Cardinality, EntityType, RelationshipDefinition};
//! use typegraph_core::ops::{InMemoryEntityTypeStore, RelationshipMutator};
//! use typegraph_core::policy::AllowAllPolicy;
//!
//! let mut store = InMemoryEntityTypeStore::new();
//! for key in ["Employee", "Department"] {
//!     store.insert(EntityType::new(format!("et-{key}"), "ws-1".into(), key.into()));
//! }
//!
//! let manager = RelationshipDefinition::origin("", "Manager", "Employee", Cardinality::ManyToOne, ["Department"])
//!     .with_bidirectional("Employees", ["Department"]);
//! let cmd = Command::CreateRelationships {
//!     definitions: vec![("Employee".to_string(), manager)],
//! };
//!
//! let ctx = MutationContext::new("ws-1", "alice");
//! let mut mutator = RelationshipMutator::new(&mut store);
//! let saved = apply(&mut mutator, &ctx, cmd, &AllowAllPolicy).unwrap();
//! assert_eq!(saved.len(), 2);
//! ```

use tracing::warn;

use crate::commands::Command;
use crate::context::MutationContext;
use crate::errors::Result;
use crate::model::EntityType;
use crate::ops::{EntityTypeStore, RelationshipMutator};
use crate::policy::SchemaAccessPolicy;

/// Authorize `cmd` for `ctx`, then run it through `mutator`
///
/// # Errors
///
/// `Forbidden` if `policy` denies the command; otherwise whatever the
/// dispatched mutator operation returns.
pub fn apply<S: EntityTypeStore>(
    mutator: &mut RelationshipMutator<'_, S>,
    ctx: &MutationContext,
    cmd: Command,
    policy: &dyn SchemaAccessPolicy,
) -> Result<Vec<EntityType>> {
    let action = cmd.action();
    if let Err(err) = policy.authorize(ctx, action) {
        warn!(
            workspace_id = %ctx.workspace_id,
            actor = %ctx.actor,
            action = action.as_str(),
            "schema change denied"
        );
        return Err(err);
    }

    match cmd {
        Command::CreateRelationships { definitions } => {
            mutator.create_relationships(ctx, definitions)
        }
        Command::RemoveRelationships { requests } => mutator.remove_relationships(ctx, requests),
        Command::UpdateRelationships { diff } => mutator.update_relationships(ctx, diff),
    }
}
