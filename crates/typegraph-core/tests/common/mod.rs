use std::collections::BTreeMap;
use std::sync::Mutex;

use typegraph_core::hooks::{Activity, ActivitySink, OperationType, SemanticMetadataHook, TargetType};
use typegraph_core::{
    Cardinality, EntityType, EntityTypeStore, InMemoryEntityTypeStore, MutationContext,
    RelationshipDefinition, Result, TypeGraphError,
};

pub const WS: &str = "ws-test";

/// Store seeded with one empty entity type per key, all in `WS`
#[allow(dead_code)]
pub fn store_with(keys: &[&str]) -> InMemoryEntityTypeStore {
    let mut store = InMemoryEntityTypeStore::new();
    for key in keys {
        store.insert(EntityType::new(
            format!("et-{}", key.to_lowercase()),
            WS.to_string(),
            key.to_string(),
        ));
    }
    store
}

#[allow(dead_code)]
pub fn ctx() -> MutationContext {
    MutationContext::new(WS, "alice")
}

/// `Employee.Manager -> Department`, inverse `Employees`
#[allow(dead_code)]
pub fn manager_origin() -> RelationshipDefinition {
    RelationshipDefinition::origin(
        "rel-manager",
        "Manager",
        "Employee",
        Cardinality::OneToMany,
        ["Department"],
    )
    .with_bidirectional("Employees", ["Department"])
}

#[allow(dead_code)]
pub fn entity_type(store: &InMemoryEntityTypeStore, key: &str) -> EntityType {
    store.find_by_key(WS, key).unwrap()
}

/// The stored REFERENCE mirroring `origin_id` on entity type `key`
#[allow(dead_code)]
pub fn reference_on(
    store: &InMemoryEntityTypeStore,
    key: &str,
    origin_id: &str,
) -> Option<RelationshipDefinition> {
    entity_type(store, key)
        .reference_for_origin(origin_id)
        .cloned()
}

#[allow(dead_code)]
pub fn stored_relationship(
    store: &InMemoryEntityTypeStore,
    key: &str,
    id: &str,
) -> Option<RelationshipDefinition> {
    entity_type(store, key).relationship(id).cloned()
}

/// Every live entity type in `WS`, owned
#[allow(dead_code)]
pub fn all_types(store: &InMemoryEntityTypeStore) -> Vec<EntityType> {
    store.list(WS).into_iter().cloned().collect()
}

/// Delegates lookups and fails every save
#[allow(dead_code)]
pub struct FailingSaveStore {
    pub inner: InMemoryEntityTypeStore,
}

impl EntityTypeStore for FailingSaveStore {
    fn find_by_key(&self, workspace_id: &str, key: &str) -> Result<EntityType> {
        self.inner.find_by_key(workspace_id, key)
    }

    fn find_by_keys(&self, workspace_id: &str, keys: &[String]) -> Result<Vec<EntityType>> {
        self.inner.find_by_keys(workspace_id, keys)
    }

    fn find_by_id(&self, id: &str) -> Result<EntityType> {
        self.inner.find_by_id(id)
    }

    fn save_all(&mut self, _entity_types: Vec<EntityType>) -> Result<Vec<EntityType>> {
        Err(TypeGraphError::Persistence {
            reason: "disk full".to_string(),
        })
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityCall {
    pub activity: Activity,
    pub operation: OperationType,
    pub actor: String,
    pub entity_id: String,
    pub details: BTreeMap<String, String>,
}

/// Records every activity; optionally fails after recording
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingActivitySink {
    pub calls: Mutex<Vec<ActivityCall>>,
    pub fail: bool,
}

impl RecordingActivitySink {
    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<ActivityCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ActivitySink for RecordingActivitySink {
    fn log(
        &self,
        activity: Activity,
        operation: OperationType,
        actor: &str,
        _workspace_id: &str,
        entity_id: &str,
        details: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(ActivityCall {
            activity,
            operation,
            actor: actor.to_string(),
            entity_id: entity_id.to_string(),
            details: details.clone(),
        });
        if self.fail {
            return Err(TypeGraphError::Persistence {
                reason: "audit log unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Records relationship ids passed to each semantic metadata callback
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSemanticHook {
    pub initialized: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingSemanticHook {
    #[allow(dead_code)]
    pub fn initialized(&self) -> Vec<String> {
        self.initialized.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl SemanticMetadataHook for RecordingSemanticHook {
    fn initialize_for_target(
        &self,
        _entity_type_id: &str,
        _workspace_id: &str,
        _target_type: TargetType,
        target_id: &str,
    ) -> Result<()> {
        self.initialized.lock().unwrap().push(target_id.to_string());
        if self.fail {
            return Err(TypeGraphError::Persistence {
                reason: "metadata service down".to_string(),
            });
        }
        Ok(())
    }

    fn delete_for_target(
        &self,
        _entity_type_id: &str,
        _target_type: TargetType,
        target_id: &str,
    ) -> Result<()> {
        self.deleted.lock().unwrap().push(target_id.to_string());
        if self.fail {
            return Err(TypeGraphError::Persistence {
                reason: "metadata service down".to_string(),
            });
        }
        Ok(())
    }
}
