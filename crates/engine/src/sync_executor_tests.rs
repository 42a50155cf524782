use std::sync::Arc;
use std::time::Duration;

use max_connector::fake::{FakeConnector, FakeInstallation, FnLoader};
use max_core::{
    EntityId, EntityInput, EntityTypeId, FakeClock, LoaderName, Operation, Page, Ref, Scope, Schema, Step, SyncPlan,
    Target,
};
use max_storage::{MemorySyncMeta, TaskStore};

use super::*;
use crate::memory_engine::MemoryEngine;
use crate::task_runner::DefaultTaskRunner;

fn root_ref() -> Ref {
    Ref::new(EntityTypeId::from_string("typ-root"), EntityId::from_string("ent-root"), Scope::Installation)
}

fn person_ref(suffix: &str) -> Ref {
    Ref::new(EntityTypeId::from_string("typ-person"), EntityId::from_string(format!("ent-{suffix}")), Scope::Installation)
}

#[tokio::test]
async fn a_plan_with_one_load_fields_step_completes() {
    let store = Arc::new(TaskStore::new(FakeClock::new()));
    let engine = Arc::new(MemoryEngine::new());
    let mut connector = FakeConnector::new("acme", Schema::new("acme"), SyncPlan::new());
    let loader_name = LoaderName::from_string("ldr-profile");
    connector.resolver.field_loaders.insert(("typ-person".to_string(), "name".to_string()), loader_name.clone());
    let target_ref = person_ref("1");
    let loader = FnLoader::new(
        {
            let target_ref = target_ref.clone();
            move |_refs, _fields| {
                Ok(vec![EntityInput {
                    entity_ref: target_ref.clone(),
                    fields: [("name".to_string(), serde_json::Value::String("Ada".into()))].into_iter().collect(),
                }])
            }
        },
        |_, _, _| Ok(Page::last(Vec::new())),
    );
    connector = connector.with_loader(loader_name, Arc::new(loader));

    let runner = Arc::new(DefaultTaskRunner::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        engine.clone() as Arc<dyn max_core::Engine>,
        engine.clone() as Arc<dyn crate::memory_engine::CollectionSink>,
        Arc::new(MemorySyncMeta::new()) as Arc<dyn max_core::SyncMeta>,
        FakeClock::new(),
    ));

    let executor = SyncExecutor::new(store.clone(), runner, FakeClock::new());
    let plan = SyncPlan::new().with_step(Step::new(Target::for_one(target_ref.clone()), Operation::load_fields(["name"])));
    let handle = executor.execute(max_core::SyncId::new(), plan);

    let completion = tokio::time::timeout(Duration::from_secs(5), handle.completion(&store))
        .await
        .expect("sync did not settle in time");

    assert_eq!(completion.status, SyncStatus::Completed);
    // sync-group + sync-step + one load-fields batch (single ref, single loader).
    assert_eq!(completion.tasks_completed, 3);
    assert_eq!(completion.tasks_failed, 0);

    let stored = engine.load(&target_ref, max_core::Projection::All).await.unwrap();
    assert_eq!(stored.fields.get("name"), Some(&serde_json::Value::String("Ada".into())));
}

#[tokio::test]
async fn a_step_referencing_an_unknown_loader_fails_the_sync() {
    let store = Arc::new(TaskStore::new(FakeClock::new()));
    let engine = Arc::new(MemoryEngine::new());
    let connector = FakeConnector::new("acme", Schema::new("acme"), SyncPlan::new());

    let runner = Arc::new(DefaultTaskRunner::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        engine.clone() as Arc<dyn max_core::Engine>,
        engine as Arc<dyn crate::memory_engine::CollectionSink>,
        Arc::new(MemorySyncMeta::new()) as Arc<dyn max_core::SyncMeta>,
        FakeClock::new(),
    ));

    let executor = SyncExecutor::new(store.clone(), runner, FakeClock::new());
    let plan = SyncPlan::new()
        .with_step(Step::new(Target::for_one(person_ref("1")), Operation::load_fields(["name"])));
    let handle = executor.execute(max_core::SyncId::new(), plan);

    let completion = tokio::time::timeout(Duration::from_secs(5), handle.completion(&store))
        .await
        .expect("sync did not settle in time");

    assert_eq!(completion.status, SyncStatus::Failed);
    assert!(completion.tasks_failed > 0);
}

#[tokio::test]
async fn an_empty_collection_on_the_root_still_completes() {
    let store = Arc::new(TaskStore::new(FakeClock::new()));
    let engine = Arc::new(MemoryEngine::new());
    let mut connector = FakeConnector::new("acme", Schema::new("acme"), SyncPlan::new());
    let loader_name = LoaderName::from_string("ldr-items");
    connector.resolver.collection_loaders.insert(("typ-root".to_string(), "items".to_string()), loader_name.clone());
    let loader = FnLoader::empty();
    connector = connector.with_loader(loader_name, Arc::new(loader));

    let runner = Arc::new(DefaultTaskRunner::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        engine.clone() as Arc<dyn max_core::Engine>,
        engine.clone() as Arc<dyn crate::memory_engine::CollectionSink>,
        Arc::new(MemorySyncMeta::new()) as Arc<dyn max_core::SyncMeta>,
        FakeClock::new(),
    ));

    let executor = SyncExecutor::new(store.clone(), runner, FakeClock::new());
    let plan = SyncPlan::new().with_step(Step::new(Target::for_root(root_ref()), Operation::load_collection("items")));
    let handle = executor.execute(max_core::SyncId::new(), plan);

    let completion = tokio::time::timeout(Duration::from_secs(5), handle.completion(&store))
        .await
        .expect("sync did not settle in time");

    assert_eq!(completion.status, SyncStatus::Completed);
    // sync-group + sync-step + one load-collection task (single parent ref).
    assert_eq!(completion.tasks_completed, 3);
    assert_eq!(completion.tasks_failed, 0);
}

#[tokio::test]
async fn cancel_stops_the_drain_loop() {
    let store = Arc::new(TaskStore::new(FakeClock::new()));
    let engine = Arc::new(MemoryEngine::new());
    let connector = FakeConnector::new("acme", Schema::new("acme"), SyncPlan::new());

    let runner = Arc::new(DefaultTaskRunner::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        engine.clone() as Arc<dyn max_core::Engine>,
        engine as Arc<dyn crate::memory_engine::CollectionSink>,
        Arc::new(MemorySyncMeta::new()) as Arc<dyn max_core::SyncMeta>,
        FakeClock::new(),
    ));

    let executor = SyncExecutor::new(store.clone(), runner, FakeClock::new());
    let plan = SyncPlan::new()
        .with_step(Step::new(Target::for_one(person_ref("1")), Operation::load_fields(["name"])));
    let handle = executor.execute(max_core::SyncId::new(), plan);
    handle.cancel(&store);

    let completion = tokio::time::timeout(Duration::from_secs(5), handle.completion(&store))
        .await
        .expect("sync did not settle in time");
    assert_eq!(completion.status, SyncStatus::Cancelled);
}
