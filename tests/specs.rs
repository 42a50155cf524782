// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios exercising the federation, RPC, and sync-executor
//! subsystems together, the way a real deployment wires them.

use std::sync::Arc;
use std::time::Duration;

use max_connector::fake::{FakeConnector, FakeInstallation, FnLoader};
use max_core::{
    Engine, EntityId, EntityTypeId, Facet, FakeClock, LoaderName, Operation, Page, Ref, Scope, Schema,
    Step, SyncPlan, Target,
};
use max_federation::InstallationMax;
use max_rpc::contracts::{InstallationClient, SyncStatus};
use max_rpc::dispatcher::Dispatcher;
use max_rpc::handler::EngineHandler;
use max_storage::{InstallationRegistry, MemorySyncMeta};
use max_wire::{Dispatch, Request, Transport, UnixSocketServer, UnixSocketTransport};

fn root_ref() -> Ref {
    Ref::new(EntityTypeId::from_string("typ-root"), EntityId::from_string("ent-root"), Scope::Installation)
}

async fn settle(installation: &InstallationMax<FakeClock>, sync_id: max_core::SyncId) -> max_rpc::contracts::SyncCompletion {
    tokio::time::timeout(Duration::from_secs(5), installation.sync_completion(&sync_id))
        .await
        .expect("sync did not settle in time")
        .unwrap()
}

/// *A. Empty sync on a trivial installation* (`spec.md` §8): a root `R`
/// with one empty collection settles completed with no failures.
#[tokio::test]
async fn empty_sync_on_a_trivial_installation_completes_with_no_failures() {
    let schema = Schema::new("acme").with_root(EntityTypeId::from_string("typ-root"));
    let plan = SyncPlan::new().with_step(Step::new(Target::for_root(root_ref()), Operation::load_collection("items")));

    let mut connector = FakeConnector::new("acme", schema, plan);
    let loader_name = LoaderName::from_string("ldr-items");
    connector.resolver.collection_loaders.insert(("typ-root".to_string(), "items".to_string()), loader_name.clone());
    connector = connector.with_loader(loader_name, Arc::new(FnLoader::empty()));

    let installation = InstallationMax::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        Arc::new(MemorySyncMeta::new()),
        FakeClock::new(),
    );

    let sync_id = installation.sync().await.unwrap();
    let completion = settle(&installation, sync_id).await;

    assert_eq!(completion.status, SyncStatus::Completed);
    // sync-group + sync-step + one load-collection task (single root ref).
    assert_eq!(completion.tasks_completed, 3);
    assert_eq!(completion.tasks_failed, 0);

    let items = installation.load_collection(&root_ref(), "items", None).await.unwrap();
    assert!(items.items.is_empty());
}

/// *B. Full Acme-style sync* (`spec.md` §8): a root's `workspaces`
/// collection resolves to one workspace with three users, every field
/// loaded and recorded as synced.
#[tokio::test]
async fn full_acme_style_sync_populates_every_field_and_records_sync_meta() {
    let root_type = EntityTypeId::from_string("typ-root");
    let workspace_type = EntityTypeId::from_string("typ-workspace");
    let user_type = EntityTypeId::from_string("typ-user");

    let schema = Schema::new("acme").with_root(root_type.clone());
    let plan = SyncPlan::new()
        .with_step(Step::new(Target::for_root(root_ref()), Operation::load_collection("workspaces")))
        .with_step(
            Step::new(Target::for_all(workspace_type.clone()), Operation::load_fields(["name"]))
                .blocked_by([0]),
        )
        .with_step(
            Step::new(Target::for_all(workspace_type.clone()), Operation::load_collection("users"))
                .blocked_by([0]),
        )
        .with_step(
            Step::new(
                Target::for_all(user_type.clone()),
                Operation::load_fields(["displayName", "email", "role", "active"]),
            )
            .blocked_by([2]),
        );

    let workspace_ref = Ref::new(workspace_type.clone(), EntityId::from_string("ent-ws-1"), Scope::Installation);
    let user_refs: Vec<Ref> = (1..=3)
        .map(|n| Ref::new(user_type.clone(), EntityId::from_string(format!("ent-user-{n}")), Scope::Installation))
        .collect();

    let mut connector = FakeConnector::new("acme", schema, plan);

    let workspaces_loader = LoaderName::from_string("ldr-workspaces");
    connector
        .resolver
        .collection_loaders
        .insert(("typ-root".to_string(), "workspaces".to_string()), workspaces_loader.clone());
    {
        let workspace_ref = workspace_ref.clone();
        connector = connector.with_loader(
            workspaces_loader,
            Arc::new(FnLoader::new(
                |_, _| Ok(Vec::new()),
                move |_, _, _| Ok(Page::last(vec![workspace_ref.clone()])),
            )),
        );
    }

    let workspace_name_loader = LoaderName::from_string("ldr-workspace-name");
    connector
        .resolver
        .field_loaders
        .insert(("typ-workspace".to_string(), "name".to_string()), workspace_name_loader.clone());
    connector = connector.with_loader(
        workspace_name_loader,
        Arc::new(FnLoader::new(
            |refs, _fields| {
                Ok(refs
                    .iter()
                    .map(|r| max_core::EntityInput {
                        entity_ref: r.clone(),
                        fields: [("name".to_string(), serde_json::Value::String("Acme HQ".into()))]
                            .into_iter()
                            .collect(),
                    })
                    .collect())
            },
            |_, _, _| Ok(Page::last(Vec::new())),
        )),
    );

    let users_loader = LoaderName::from_string("ldr-users");
    connector.resolver.collection_loaders.insert(("typ-workspace".to_string(), "users".to_string()), users_loader.clone());
    {
        let user_refs = user_refs.clone();
        connector = connector.with_loader(
            users_loader,
            Arc::new(FnLoader::new(|_, _| Ok(Vec::new()), move |_, _, _| Ok(Page::last(user_refs.clone())))),
        );
    }

    let user_fields_loader = LoaderName::from_string("ldr-user-fields");
    for field in ["displayName", "email", "role", "active"] {
        connector
            .resolver
            .field_loaders
            .insert(("typ-user".to_string(), field.to_string()), user_fields_loader.clone());
    }
    connector = connector.with_loader(
        user_fields_loader,
        Arc::new(FnLoader::new(
            |refs, fields| {
                Ok(refs
                    .iter()
                    .map(|r| max_core::EntityInput {
                        entity_ref: r.clone(),
                        fields: fields
                            .iter()
                            .map(|f| (f.clone(), serde_json::Value::String(format!("{f}-value"))))
                            .collect(),
                    })
                    .collect())
            },
            |_, _, _| Ok(Page::last(Vec::new())),
        )),
    );

    let sync_meta = Arc::new(MemorySyncMeta::new());
    let installation = InstallationMax::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        sync_meta.clone(),
        FakeClock::new(),
    );

    let sync_id = installation.sync().await.unwrap();
    let completion = settle(&installation, sync_id).await;
    assert_eq!(completion.status, SyncStatus::Completed);
    assert_eq!(completion.tasks_failed, 0);

    let stored_workspace = installation.load(&workspace_ref, max_core::Projection::All).await.unwrap();
    assert_eq!(stored_workspace.fields.get("name"), Some(&serde_json::Value::String("Acme HQ".into())));

    for user_ref in &user_refs {
        let stored = installation.load(user_ref, max_core::Projection::All).await.unwrap();
        for field in ["displayName", "email", "role", "active"] {
            assert!(stored.fields.contains_key(field), "missing field {field} on {user_ref}");
        }
    }

    // `_sync_meta` rows = (1 workspace x 1 field) + (3 users x 4 fields) = 13 (spec.md §8).
    use max_core::SyncMeta as _;
    assert!(sync_meta.field_synced_at(&workspace_ref, "name").await.is_some());
    for user_ref in &user_refs {
        for field in ["displayName", "email", "role", "active"] {
            assert!(sync_meta.field_synced_at(user_ref, field).await.is_some(), "no sync_meta row for {field} on {user_ref}");
        }
    }
}

/// *D. Concurrent sync handles* (`spec.md` §8): two `sync()` calls return
/// distinct ids and both settle successfully.
#[tokio::test]
async fn concurrent_sync_handles_on_the_same_installation_both_complete() {
    let root_type = EntityTypeId::from_string("typ-root");
    let schema = Schema::new("acme").with_root(root_type);
    let plan = SyncPlan::new().with_step(Step::new(Target::for_root(root_ref()), Operation::load_collection("items")));

    let mut connector = FakeConnector::new("acme", schema, plan);
    let loader_name = LoaderName::from_string("ldr-items");
    connector.resolver.collection_loaders.insert(("typ-root".to_string(), "items".to_string()), loader_name.clone());
    connector = connector.with_loader(loader_name, Arc::new(FnLoader::empty()));

    let installation = InstallationMax::new(
        Arc::new(connector),
        Arc::new(FakeInstallation { config: serde_json::Value::Null }),
        Arc::new(MemorySyncMeta::new()),
        FakeClock::new(),
    );

    let first = installation.sync().await.unwrap();
    let second = installation.sync().await.unwrap();
    assert_ne!(first, second);

    let first_completion = settle(&installation, first).await;
    let second_completion = settle(&installation, second).await;
    assert_eq!(first_completion.status, SyncStatus::Completed);
    assert_eq!(second_completion.status, SyncStatus::Completed);
}

/// *E. Scope routing* (`spec.md` §8): a request scoped to a registered
/// installation routes to its dispatcher; an unknown id reports
/// `rpc.node_not_found`.
#[tokio::test]
async fn scope_routing_delegates_to_the_registered_installation_and_reports_unknown_ids() {
    let schema = Schema::new("acme");
    let connector: Arc<dyn max_connector::Connector> = Arc::new(FakeConnector::new("acme", schema, SyncPlan::new()));

    let workspace = max_federation::WorkspaceMax::new(
        Arc::new(InstallationRegistry::new()),
        vec![connector.clone()],
        vec![Arc::new(max_federation::InProcessDeployer::new(
            |config: serde_json::Value, spec: max_federation::InstallationSpec| {
                Box::pin(async move {
                    let installation = Arc::new(FakeInstallation { config });
                    let node = Arc::new(InstallationMax::new(
                        spec.connector,
                        installation,
                        Arc::new(MemorySyncMeta::new()),
                        FakeClock::new(),
                    ));
                    Ok(max_federation::InstallationHandle {
                        client: node.clone() as Arc<dyn InstallationClient>,
                        engine: node as Arc<dyn max_core::Engine>,
                    })
                })
            },
        ))],
        FakeClock::new(),
    );

    let id = workspace
        .create_installation(max_rpc::contracts::InstallationConfig {
            connector: "acme".to_string(),
            name: "prod".to_string(),
            strategy: "in-process".to_string(),
            config: serde_json::Value::Null,
        })
        .await
        .unwrap();

    let dispatcher = Dispatcher::new().with_installation_router(Arc::new(workspace));

    let request = Request::new("r1", "", "health")
        .with_scope(max_wire::RequestScope { workspace_id: None, installation_id: Some(id.to_string()) });
    let response = dispatcher.dispatch(request).await;
    assert_eq!(response.into_result().unwrap()["kind"], "healthy");

    let missing = Request::new("r2", "", "health")
        .with_scope(max_wire::RequestScope { workspace_id: None, installation_id: Some("inst-missing".to_string()) });
    let response = dispatcher.dispatch(missing).await;
    let err = response.into_result().unwrap_err();
    assert_eq!(err.code, "rpc.node_not_found");
}

/// *F. Error reconstitution* (`spec.md` §8): an engine error crossing the
/// dispatcher keeps its facets intact.
#[tokio::test]
async fn an_engine_error_crossing_the_dispatcher_keeps_its_facets() {
    let engine = Arc::new(max_engine::MemoryEngine::new());
    let dispatcher = Dispatcher::new().with_target("engine", Arc::new(EngineHandler::new(engine)));

    let missing = root_ref();
    let request = Request::new("r1", "engine", "load")
        .with_args(vec![serde_json::to_value(&missing).unwrap(), serde_json::to_value(max_core::Projection::All).unwrap()]);

    let response = dispatcher.dispatch(request).await;
    let err = response.into_result().unwrap_err();

    // Round-trip through the wire encoding, the way a real transport would.
    let wire = serde_json::to_string(&err).unwrap();
    let reconstituted: max_core::MaxError = serde_json::from_str(&wire).unwrap();

    similar_asserts::assert_eq!(reconstituted, err);
    assert_eq!(reconstituted.code, "core.entity_not_found");
    assert!(reconstituted.has(Facet::NotFound));
    assert!(reconstituted.has(Facet::HasEntityRef));
}

/// *C. Socket transport roundtrip* (`spec.md` §8): a request sent over a
/// real Unix domain socket reaches the handler and the response reaches
/// the client on the other end.
#[tokio::test]
#[serial_test::serial]
async fn rpc_roundtrip_over_a_socket_transport_reaches_the_handler() {
    let engine = Arc::new(max_engine::MemoryEngine::new());
    let dispatcher: Arc<dyn Dispatch> =
        Arc::new(Dispatcher::new().with_target("engine", Arc::new(EngineHandler::new(engine))));

    let socket_dir = tempfile::tempdir().unwrap();
    let socket_path = socket_dir.path().join("max.sock");
    let _server = UnixSocketServer::bind(&socket_path, dispatcher).unwrap();

    let stream = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match tokio::net::UnixStream::connect(&socket_path).await {
                Ok(stream) => return stream,
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
    })
    .await
    .expect("socket server never became connectable");

    let client = UnixSocketTransport::spawn(stream);

    let entity_ref = root_ref();
    let input = max_core::EntityInput {
        entity_ref: entity_ref.clone(),
        fields: [("name".to_string(), serde_json::Value::String("Acme".into()))].into_iter().collect(),
    };
    let store_request =
        Request::new("r1", "engine", "store").with_args(vec![serde_json::to_value(&input).unwrap()]);
    client.send(store_request).await.unwrap().into_result().unwrap();

    let load_request = Request::new("r2", "engine", "load")
        .with_args(vec![serde_json::to_value(&entity_ref).unwrap(), serde_json::to_value(max_core::Projection::All).unwrap()]);
    let response = client.send(load_request).await.unwrap();
    let result = response.into_result().unwrap();
    assert_eq!(result["fields"]["name"], "Acme");
}
