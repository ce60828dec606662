//! Relationship mutation orchestrator
//!
//! Every public operation is one unit of work:
//!
//! 1. Build a request-local `WorkingSet` of the entity types involved
//! 2. Apply the requested changes and their cascades in memory
//! 3. Validate the final working set
//! 4. Persist every touched entity type with a single `save_all`
//! 5. Notify the collaborator hooks
//!
//! An error in steps 1-4 leaves the store untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use super::store::EntityTypeStore;
use super::synthesizer::RelationshipSynthesizer;
use super::working_set::{JournalChange, JournalEntry, WorkingSet};
use crate::config::MutatorConfig;
use crate::context::MutationContext;
use crate::diff::{
    change_flags, render_human_summary, ChangeFlag, RelationshipDiff, RelationshipModification,
};
use crate::errors::{Result, TypeGraphError};
use crate::hooks::{
    Activity, ActivitySink, NoopActivitySink, NoopSemanticMetadataHook, OperationType,
    SemanticMetadataHook, TargetType,
};
use crate::model::{EntityType, RelationshipDefinition, RelationshipKind};
use crate::rules::validation::{self, ValidationOperation};
use crate::{log_op_end, log_op_error, log_op_start};

static NOOP_SEMANTIC_HOOK: NoopSemanticMetadataHook = NoopSemanticMetadataHook;
static NOOP_ACTIVITY_SINK: NoopActivitySink = NoopActivitySink;

/// How far the removal of a REFERENCE reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteAction {
    /// Drop only this inverse view; the ORIGIN stops listing this entity type
    /// as a bidirectional target
    RemoveBidirectional,
    /// As `RemoveBidirectional`, and the ORIGIN no longer targets this
    /// entity type at all
    RemoveEntityType,
    /// Delete the ORIGIN and every REFERENCE it owns
    DeleteRelationship,
}

/// One relationship to remove
///
/// The action only matters for REFERENCEs; an ORIGIN is always deleted
/// together with its inverses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub relationship: RelationshipDefinition,
    pub action: DeleteAction,
}

impl DeleteRequest {
    pub fn new(relationship: RelationshipDefinition, action: DeleteAction) -> Self {
        Self {
            relationship,
            action,
        }
    }
}

/// In-memory state of one unit of work
struct Batch {
    working_set: WorkingSet,
    checks: Vec<(RelationshipDefinition, ValidationOperation)>,
    removed: BTreeSet<String>,
}

impl Batch {
    fn new(workspace_id: &str) -> Self {
        Self {
            working_set: WorkingSet::new(workspace_id),
            checks: Vec::new(),
            removed: BTreeSet::new(),
        }
    }

    fn check(&mut self, relationship: RelationshipDefinition, operation: ValidationOperation) {
        self.checks.push((relationship, operation));
    }

    fn removed(&mut self, relationship: RelationshipDefinition) {
        self.removed.insert(relationship.id.clone());
        self.check(relationship, ValidationOperation::Delete);
    }
}

/// Top-level orchestrator for relationship create, delete and update
pub struct RelationshipMutator<'a, S: EntityTypeStore> {
    store: &'a mut S,
    semantic_hook: &'a dyn SemanticMetadataHook,
    activity_sink: &'a dyn ActivitySink,
    synthesizer: RelationshipSynthesizer,
    config: MutatorConfig,
}

impl<'a, S: EntityTypeStore> RelationshipMutator<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        let config = MutatorConfig::default();
        Self {
            store,
            semantic_hook: &NOOP_SEMANTIC_HOOK,
            activity_sink: &NOOP_ACTIVITY_SINK,
            synthesizer: RelationshipSynthesizer::new(config.collision_suffix_start),
            config,
        }
    }

    pub fn with_semantic_hook(mut self, hook: &'a dyn SemanticMetadataHook) -> Self {
        self.semantic_hook = hook;
        self
    }

    pub fn with_activity_sink(mut self, sink: &'a dyn ActivitySink) -> Self {
        self.activity_sink = sink;
        self
    }

    pub fn with_config(mut self, config: MutatorConfig) -> Self {
        self.synthesizer = RelationshipSynthesizer::new(config.collision_suffix_start);
        self.config = config;
        self
    }

    pub fn config(&self) -> &MutatorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &*self.store
    }

    /// Attach each `(source_key, definition)` to its source entity type
    ///
    /// Bidirectional ORIGINs get their REFERENCEs synthesized on every
    /// target. A REFERENCE supplied directly is linked into its ORIGIN,
    /// which becomes bidirectional towards the REFERENCE's entity type.
    /// A definition whose id already exists on its source type is applied
    /// as an edit of that relationship, the same way `update_relationships`
    /// applies a modification.
    ///
    /// # Errors
    ///
    /// - `EntityTypeNotFound` if any referenced entity type is unknown
    /// - Validation errors for incomplete or inconsistent definitions,
    ///   including duplicate names
    /// - `Persistence` from the store
    pub fn create_relationships(
        &mut self,
        ctx: &MutationContext,
        definitions: Vec<(String, RelationshipDefinition)>,
    ) -> Result<Vec<EntityType>> {
        const OP: &str = "create_relationships";
        let start = Instant::now();
        log_op_start!(
            OP,
            workspace_id = %ctx.workspace_id,
            request_id = %ctx.request.request_id,
            definition_count = definitions.len()
        );

        let result = self
            .stage_create(ctx, definitions)
            .and_then(|batch| self.commit(ctx, batch));
        self.finish(OP, ctx, start, result)
    }

    /// Remove relationships, cascading to their paired records
    ///
    /// # Errors
    ///
    /// - `RelationshipNotFound` if a relationship is not on its source type
    /// - `OriginRelationshipNotFound` if a REFERENCE names an origin that
    ///   resolves nowhere
    /// - `ProtectedRelationship` for a protected ORIGIN or REFERENCE
    /// - Validation errors if an inverse would be left orphaned
    /// - `Persistence` from the store
    pub fn remove_relationships(
        &mut self,
        ctx: &MutationContext,
        requests: Vec<DeleteRequest>,
    ) -> Result<Vec<EntityType>> {
        const OP: &str = "remove_relationships";
        let start = Instant::now();
        log_op_start!(
            OP,
            workspace_id = %ctx.workspace_id,
            request_id = %ctx.request.request_id,
            definition_count = requests.len()
        );

        let result = self
            .stage_remove(ctx, requests)
            .and_then(|batch| self.commit(ctx, batch));
        self.finish(OP, ctx, start, result)
    }

    /// Reconcile the stored graph with a relationship diff
    ///
    /// `added` follow the create path, `removed` the delete path (REFERENCEs
    /// with `RemoveBidirectional`), and each `modified` entry overwrites its
    /// record before its change flags are propagated to the inverses.
    ///
    /// # Errors
    ///
    /// - `RelationshipKindChanged` if a modification turns an ORIGIN into a
    ///   REFERENCE or back
    /// - `InverseMissing` if a cardinality change finds an expected inverse gone
    /// - `MissingBidirectionalTargets` when enabling bidirectional without targets
    /// - Everything `create_relationships` and `remove_relationships` return
    pub fn update_relationships(
        &mut self,
        ctx: &MutationContext,
        diff: RelationshipDiff,
    ) -> Result<Vec<EntityType>> {
        const OP: &str = "update_relationships";
        let start = Instant::now();
        log_op_start!(
            OP,
            workspace_id = %ctx.workspace_id,
            request_id = %ctx.request.request_id,
            definition_count = diff.len()
        );
        debug!(summary = %render_human_summary(&diff), "relationship diff");

        let result = self
            .stage_update(ctx, diff)
            .and_then(|batch| self.commit(ctx, batch));
        self.finish(OP, ctx, start, result)
    }

    fn finish(
        &self,
        op: &'static str,
        ctx: &MutationContext,
        start: Instant,
        result: Result<Vec<EntityType>>,
    ) -> Result<Vec<EntityType>> {
        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(saved) => {
                log_op_end!(
                    op,
                    duration_ms = duration_ms,
                    workspace_id = %ctx.workspace_id,
                    request_id = %ctx.request.request_id,
                    saved = saved.len()
                );
            }
            Err(err) => {
                log_op_error!(
                    op,
                    err,
                    duration_ms = duration_ms,
                    workspace_id = %ctx.workspace_id,
                    request_id = %ctx.request.request_id
                );
            }
        }
        result
    }

    // ===== Staging =====

    fn stage_create(
        &self,
        ctx: &MutationContext,
        mut definitions: Vec<(String, RelationshipDefinition)>,
    ) -> Result<Batch> {
        let mut batch = Batch::new(&ctx.workspace_id);

        let mut keys = BTreeSet::new();
        for (source, def) in &mut definitions {
            def.source_entity_type_key = source.clone();
            keys.extend(def.referenced_keys());
        }
        batch.working_set.preload(keys, self.loader())?;

        for (source, def) in definitions {
            self.apply_create(&mut batch, source, def)?;
        }
        Ok(batch)
    }

    fn stage_remove(&self, ctx: &MutationContext, requests: Vec<DeleteRequest>) -> Result<Batch> {
        let mut batch = Batch::new(&ctx.workspace_id);

        // Cascade targets are resolved lazily; a tombstoned target is skipped
        let sources: BTreeSet<String> = requests
            .iter()
            .map(|r| r.relationship.source_entity_type_key.clone())
            .collect();
        batch.working_set.preload(sources, self.loader())?;

        for request in requests {
            self.apply_delete(&mut batch, &request.relationship, request.action)?;
        }
        Ok(batch)
    }

    fn stage_update(&self, ctx: &MutationContext, diff: RelationshipDiff) -> Result<Batch> {
        let mut batch = Batch::new(&ctx.workspace_id);

        // Removals only need their source types; cascade targets resolve lazily
        let mut keys: BTreeSet<String> = diff
            .removed
            .iter()
            .map(|r| r.source_entity_type_key.clone())
            .collect();
        for def in &diff.added {
            keys.extend(def.referenced_keys());
        }
        for m in &diff.modified {
            keys.extend(m.previous.referenced_keys());
            keys.extend(m.updated.referenced_keys());
        }
        batch.working_set.preload(keys, self.loader())?;

        debug!(
            workspace_id = %ctx.workspace_id,
            added = diff.added.len(),
            removed = diff.removed.len(),
            modified = diff.modified.len(),
            "applying relationship diff"
        );

        let RelationshipDiff {
            added,
            removed,
            modified,
        } = diff;

        for def in added {
            let source = def.source_entity_type_key.clone();
            self.apply_create(&mut batch, source, def)?;
        }
        for def in removed {
            self.apply_delete(&mut batch, &def, DeleteAction::RemoveBidirectional)?;
        }
        for modification in modified {
            self.apply_modification(&mut batch, modification)?;
        }
        Ok(batch)
    }

    // ===== Create =====

    fn apply_create(
        &self,
        batch: &mut Batch,
        source: String,
        mut def: RelationshipDefinition,
    ) -> Result<()> {
        def.source_entity_type_key = source.clone();
        if def.id.is_empty() {
            def.id = Uuid::now_v7().to_string();
        }
        if def.is_bidirectional_origin() {
            validation::validate_origin_shape(&def)?;
        }

        let source_type = batch.working_set.resolve(&source, self.loader())?;
        if let Some(previous) = source_type.relationship(&def.id).cloned() {
            // Re-creating an existing id edits it, inverses included
            let changes = change_flags(&previous, &def);
            return self.apply_modification(
                batch,
                RelationshipModification {
                    previous,
                    updated: def,
                    changes,
                },
            );
        }
        source_type.upsert_relationship(def.clone());
        batch
            .working_set
            .record(JournalChange::Added, &source, &def);
        batch.check(def.clone(), ValidationOperation::Create);

        match def.kind {
            RelationshipKind::Origin {
                bidirectional: true,
                ..
            } => {
                let references =
                    self.synthesizer
                        .synthesize_inverses(&def, &mut batch.working_set, self.loader())?;
                for reference in references {
                    batch.check(reference, ValidationOperation::Create);
                }
            }
            RelationshipKind::Origin { .. } => {}
            RelationshipKind::Reference { .. } => self.link_reference(batch, &def)?,
        }
        Ok(())
    }

    /// Make the ORIGIN of a directly supplied REFERENCE list its entity type
    fn link_reference(&self, batch: &mut Batch, reference: &RelationshipDefinition) -> Result<()> {
        let origin_id =
            reference
                .origin_relationship_id()
                .ok_or_else(|| TypeGraphError::MissingOriginId {
                    relationship_id: reference.id.clone(),
                    name: reference.name.clone(),
                })?;

        let origin_key = self.locate_origin(batch, reference)?.ok_or_else(|| {
            TypeGraphError::OriginRelationshipNotFound {
                reference_id: reference.id.clone(),
                origin_id: origin_id.to_string(),
            }
        })?;

        let mut origin = self.origin_record(batch, &origin_key, origin_id)?;
        if let RelationshipKind::Origin {
            inverse_name,
            bidirectional,
            bidirectional_entity_type_keys,
        } = &mut origin.kind
        {
            *bidirectional = true;
            bidirectional_entity_type_keys
                .get_or_insert_with(BTreeSet::new)
                .insert(reference.source_entity_type_key.clone());
            if inverse_name.is_none() {
                *inverse_name = Some(reference.name.clone());
            }
        }
        if !origin.allow_polymorphic {
            origin
                .entity_type_keys
                .get_or_insert_with(BTreeSet::new)
                .insert(reference.source_entity_type_key.clone());
        }

        self.store_origin(batch, &origin_key, origin);
        Ok(())
    }

    // ===== Delete =====

    fn apply_delete(
        &self,
        batch: &mut Batch,
        requested: &RelationshipDefinition,
        action: DeleteAction,
    ) -> Result<()> {
        let source_key = requested.source_entity_type_key.clone();
        let source_type = batch.working_set.resolve(&source_key, self.loader())?;

        let Some(current) = source_type.relationship(&requested.id).cloned() else {
            if batch.removed.contains(&requested.id) {
                debug!(relationship_id = %requested.id, "relationship already removed in this batch");
                return Ok(());
            }
            return Err(TypeGraphError::RelationshipNotFound {
                entity_type_key: source_key,
                relationship_id: requested.id.clone(),
            });
        };

        if current.protected {
            return Err(TypeGraphError::ProtectedRelationship {
                relationship_id: current.id.clone(),
                name: current.name.clone(),
            });
        }

        if current.is_origin() {
            return self.delete_origin(batch, current);
        }

        match action {
            DeleteAction::DeleteRelationship => {
                if let Some((origin_key, origin_id)) = self.resolve_origin(batch, &current)? {
                    let origin = self.origin_record(batch, &origin_key, &origin_id)?;
                    self.delete_origin(batch, origin)?;
                }
                // A REFERENCE the origin did not list survives the cascade
                if !batch.removed.contains(&current.id) {
                    self.remove_record(batch, &source_key, &current.id);
                }
                Ok(())
            }
            DeleteAction::RemoveBidirectional => self.unlink_reference(batch, current, false),
            DeleteAction::RemoveEntityType => self.unlink_reference(batch, current, true),
        }
    }

    fn delete_origin(&self, batch: &mut Batch, origin: RelationshipDefinition) -> Result<()> {
        if origin.protected {
            return Err(TypeGraphError::ProtectedRelationship {
                relationship_id: origin.id.clone(),
                name: origin.name.clone(),
            });
        }

        let source_key = origin.source_entity_type_key.clone();
        batch.working_set.resolve(&source_key, self.loader())?;
        self.remove_record(batch, &source_key, &origin.id);

        if origin.is_bidirectional_origin() {
            for target in origin.bidirectional_targets() {
                if let Some(reference) = self.synthesizer.remove_inverse(
                    &target,
                    &origin.id,
                    &mut batch.working_set,
                    self.loader(),
                )? {
                    batch.removed(reference);
                }
            }
        }
        Ok(())
    }

    fn unlink_reference(
        &self,
        batch: &mut Batch,
        reference: RelationshipDefinition,
        drop_entity_type: bool,
    ) -> Result<()> {
        let source_key = reference.source_entity_type_key.clone();
        let origin = self.resolve_origin(batch, &reference)?;
        self.remove_record(batch, &source_key, &reference.id);

        let Some((origin_key, origin_id)) = origin else {
            return Ok(());
        };

        let mut origin = self.origin_record(batch, &origin_key, &origin_id)?;
        if let Some(targets) = origin.bidirectional_targets_mut() {
            targets.remove(&source_key);
        }
        if drop_entity_type && !origin.allow_polymorphic {
            if let Some(keys) = origin.entity_type_keys.as_mut() {
                keys.remove(&source_key);
            }
        }

        self.store_origin(batch, &origin_key, origin);
        Ok(())
    }

    // ===== Update =====

    fn apply_modification(
        &self,
        batch: &mut Batch,
        modification: RelationshipModification,
    ) -> Result<()> {
        let RelationshipModification {
            previous,
            updated,
            changes,
        } = modification;

        if !previous.same_kind(&updated) {
            return Err(TypeGraphError::RelationshipKindChanged {
                relationship_id: previous.id.clone(),
            });
        }
        if previous.id != updated.id
            || previous.source_entity_type_key != updated.source_entity_type_key
        {
            return Err(TypeGraphError::InvalidRelationship {
                relationship_id: previous.id.clone(),
                reason: "id and source entity type cannot change".to_string(),
            });
        }

        let source_key = previous.source_entity_type_key.clone();
        let source_type = batch.working_set.resolve(&source_key, self.loader())?;
        if source_type.relationship(&previous.id).is_none() {
            return Err(TypeGraphError::RelationshipNotFound {
                entity_type_key: source_key,
                relationship_id: previous.id.clone(),
            });
        }
        source_type.upsert_relationship(updated.clone());
        batch
            .working_set
            .record(JournalChange::Modified, &source_key, &updated);
        batch.check(updated.clone(), ValidationOperation::Update);

        if updated.is_reference() {
            return Ok(());
        }

        let has = |flag: ChangeFlag| changes.contains(&flag);
        let enabled = has(ChangeFlag::BidirectionalEnabled);
        let disabled = has(ChangeFlag::BidirectionalDisabled);

        if has(ChangeFlag::InverseNameChanged) && updated.is_bidirectional_origin() {
            let renamed = self.synthesizer.rename_inverse(
                &previous,
                &updated,
                &mut batch.working_set,
                self.loader(),
            )?;
            for reference in renamed {
                batch.check(reference, ValidationOperation::Update);
            }
        }

        if has(ChangeFlag::CardinalityChanged) {
            let propagated = self.synthesizer.propagate_cardinality(
                &previous,
                &updated,
                &mut batch.working_set,
                self.loader(),
            )?;
            for reference in propagated {
                batch.check(reference, ValidationOperation::Update);
            }
        }

        if disabled {
            self.remove_inverses(batch, &previous.id, previous.bidirectional_targets())?;
        }

        if enabled {
            if updated.bidirectional_targets().is_empty() {
                return Err(TypeGraphError::MissingBidirectionalTargets {
                    relationship_id: updated.id.clone(),
                    name: updated.name.clone(),
                });
            }
            validation::validate_origin_shape(&updated)?;
            let references = self.synthesizer.synthesize_inverses(
                &updated,
                &mut batch.working_set,
                self.loader(),
            )?;
            for reference in references {
                batch.check(reference, ValidationOperation::Create);
            }
        }

        if has(ChangeFlag::BidirectionalTargetsChanged) && !enabled && !disabled {
            let before = previous.bidirectional_targets();
            let after = updated.bidirectional_targets();
            let dropped: BTreeSet<String> = before.difference(&after).cloned().collect();
            let gained: BTreeSet<String> = after.difference(&before).cloned().collect();

            self.remove_inverses(batch, &updated.id, dropped)?;
            if !gained.is_empty() {
                let references = self.synthesizer.synthesize_inverses_for(
                    &updated,
                    &gained,
                    &mut batch.working_set,
                    self.loader(),
                )?;
                for reference in references {
                    batch.check(reference, ValidationOperation::Create);
                }
            }
        }

        Ok(())
    }

    fn remove_inverses(
        &self,
        batch: &mut Batch,
        origin_id: &str,
        targets: BTreeSet<String>,
    ) -> Result<()> {
        for target in targets {
            if let Some(reference) = self.synthesizer.remove_inverse(
                &target,
                origin_id,
                &mut batch.working_set,
                self.loader(),
            )? {
                batch.removed(reference);
            }
        }
        Ok(())
    }

    // ===== Working set helpers =====

    fn loader(&self) -> &dyn EntityTypeStore {
        &*self.store
    }

    /// Key of the entity type holding the ORIGIN a REFERENCE points at
    ///
    /// Looks in the working set first, then in the REFERENCE's target types.
    fn locate_origin(
        &self,
        batch: &mut Batch,
        reference: &RelationshipDefinition,
    ) -> Result<Option<String>> {
        let Some(origin_id) = reference.origin_relationship_id() else {
            return Ok(None);
        };

        let is_origin_on = |ws: &WorkingSet, key: &str| {
            ws.get(key)
                .and_then(|t| t.relationship(origin_id))
                .is_some_and(|r| r.is_origin())
        };

        if let Some(key) = batch.working_set.owner_of(origin_id) {
            if is_origin_on(&batch.working_set, key) {
                return Ok(Some(key.to_string()));
            }
        }

        for key in reference.target_keys() {
            match batch.working_set.resolve(&key, self.loader()) {
                Ok(_) => {}
                Err(TypeGraphError::EntityTypeNotFound { .. })
                | Err(TypeGraphError::EntityTypeDeleted { .. }) => continue,
                Err(e) => return Err(e),
            }
            if is_origin_on(&batch.working_set, &key) {
                return Ok(Some(key));
            }
        }

        Ok(None)
    }

    /// Location of a REFERENCE's ORIGIN that must still be unlinked
    ///
    /// `None` when the REFERENCE names no origin or its origin was already
    /// removed earlier in this batch.
    ///
    /// # Errors
    ///
    /// `OriginRelationshipNotFound` when the origin id resolves nowhere.
    fn resolve_origin(
        &self,
        batch: &mut Batch,
        reference: &RelationshipDefinition,
    ) -> Result<Option<(String, String)>> {
        let Some(origin_id) = reference.origin_relationship_id().map(str::to_string) else {
            return Ok(None);
        };
        if batch.removed.contains(&origin_id) {
            return Ok(None);
        }
        match self.locate_origin(batch, reference)? {
            Some(origin_key) => Ok(Some((origin_key, origin_id))),
            None => Err(TypeGraphError::OriginRelationshipNotFound {
                reference_id: reference.id.clone(),
                origin_id,
            }),
        }
    }

    fn origin_record(
        &self,
        batch: &Batch,
        origin_key: &str,
        origin_id: &str,
    ) -> Result<RelationshipDefinition> {
        batch
            .working_set
            .get(origin_key)
            .and_then(|t| t.relationship(origin_id))
            .cloned()
            .ok_or_else(|| TypeGraphError::RelationshipNotFound {
                entity_type_key: origin_key.to_string(),
                relationship_id: origin_id.to_string(),
            })
    }

    fn store_origin(&self, batch: &mut Batch, origin_key: &str, origin: RelationshipDefinition) {
        if let Some(origin_type) = batch.working_set.get_mut(origin_key) {
            origin_type.upsert_relationship(origin.clone());
        }
        batch
            .working_set
            .record(JournalChange::Modified, origin_key, &origin);
        batch.check(origin, ValidationOperation::Update);
    }

    fn remove_record(&self, batch: &mut Batch, key: &str, relationship_id: &str) {
        let removed = batch
            .working_set
            .get_mut(key)
            .and_then(|t| t.remove_relationship(relationship_id));
        if let Some(relationship) = removed {
            batch
                .working_set
                .record(JournalChange::Removed, key, &relationship);
            batch.removed(relationship);
        }
    }

    // ===== Commit =====

    fn commit(&mut self, ctx: &MutationContext, batch: Batch) -> Result<Vec<EntityType>> {
        let Batch {
            working_set,
            checks,
            ..
        } = batch;

        validation::validate(&checks, working_set.types())?;
        debug!(
            workspace_id = %ctx.workspace_id,
            working_set_len = working_set.len(),
            checks = checks.len(),
            "working set validated"
        );

        let (types, journal) = working_set.into_parts();
        let saved = self.store.save_all(types)?;
        self.notify(ctx, &journal);
        Ok(saved)
    }

    fn notify(&self, ctx: &MutationContext, journal: &[JournalEntry]) {
        for entry in journal {
            if self.config.emit_semantic_metadata {
                let result = match entry.change {
                    JournalChange::Added => self.semantic_hook.initialize_for_target(
                        &entry.entity_type_id,
                        &ctx.workspace_id,
                        TargetType::Relationship,
                        &entry.relationship_id,
                    ),
                    JournalChange::Removed => self.semantic_hook.delete_for_target(
                        &entry.entity_type_id,
                        TargetType::Relationship,
                        &entry.relationship_id,
                    ),
                    JournalChange::Modified => Ok(()),
                };
                if let Err(err) = result {
                    warn!(
                        relationship_id = %entry.relationship_id,
                        error = %err,
                        "semantic metadata hook failed"
                    );
                }
            }

            if self.config.emit_activity {
                let operation = match entry.change {
                    JournalChange::Added => OperationType::Create,
                    JournalChange::Modified => OperationType::Update,
                    JournalChange::Removed => OperationType::Delete,
                };
                let activity = if entry.is_reference {
                    Activity::InverseRelationship
                } else {
                    Activity::Relationship
                };
                let details = BTreeMap::from([
                    (
                        "entity_type_key".to_string(),
                        entry.entity_type_key.clone(),
                    ),
                    (
                        "relationship_id".to_string(),
                        entry.relationship_id.clone(),
                    ),
                    (
                        "relationship_name".to_string(),
                        entry.relationship_name.clone(),
                    ),
                    (
                        "request_id".to_string(),
                        ctx.request.request_id.to_string(),
                    ),
                ]);
                if let Err(err) = self.activity_sink.log(
                    activity,
                    operation,
                    &ctx.actor,
                    &ctx.workspace_id,
                    &entry.entity_type_id,
                    &details,
                ) {
                    warn!(
                        relationship_id = %entry.relationship_id,
                        error = %err,
                        "activity sink failed"
                    );
                }
            }
        }
    }
}
