// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `InstallationMax`: a connector's live tenant (`spec.md` §4.8). Owns the
//! connector's `Installation` context and `Schema`, an `Engine`, and a
//! `SyncExecutor`; `sync()` seeds a plan and drains it, stashing the
//! resulting `SyncHandle` under its `syncId` the way an `InstallationClient`
//! caller expects to keep polling it (`spec.md` §4.5: "Sync handle
//! lifetime").

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use max_connector::{Connector, Installation};
use max_core::{
    Clock, DurationMs, Engine, EntityInput, EntityResult, EntityTypeId, HealthStatus, MaxError, Page,
    PageRequest, Projection, Query, Ref, Schema, StartResult, StopResult, Supervised, SyncId, SyncMeta,
};
use max_engine::{CollectionSink, DefaultTaskRunner, MemoryEngine, SyncExecutor, SyncHandle};
use max_rpc::contracts::{InstallationClient, SyncCompletion, SyncStatus};
use max_storage::TaskStore;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::errors::FederationError;
use crate::lifecycle::{AutoLifecycle, LifecycleEntry};

/// The `installation`/`engine` lifecycle entries have no async connect or
/// teardown step of their own in this implementation: a connector's
/// `Installation` is already resolved by the time one exists, and
/// `MemoryEngine` is a plain in-memory structure.
struct NoopNode;

#[async_trait]
impl Supervised for NoopNode {
    async fn health(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    async fn start(&self) -> StartResult {
        StartResult::Started
    }

    async fn stop(&self) -> StopResult {
        StopResult::Stopped
    }
}

/// The `executor` lifecycle entry: stopping an installation cancels every
/// sync it still has a live handle for, rather than leaving them to drain
/// against a store nobody is polling anymore.
struct ExecutorNode<C: Clock> {
    store: Arc<TaskStore<C>>,
    syncs: Arc<Mutex<HashMap<SyncId, SyncHandle>>>,
}

#[async_trait]
impl<C: Clock + 'static> Supervised for ExecutorNode<C> {
    async fn health(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    async fn start(&self) -> StartResult {
        StartResult::Started
    }

    async fn stop(&self) -> StopResult {
        let handles: Vec<SyncHandle> = self.syncs.lock().values().cloned().collect();
        for handle in handles {
            handle.cancel(&self.store);
        }
        StopResult::Stopped
    }
}

fn map_status(status: max_engine::SyncStatus) -> SyncStatus {
    match status {
        max_engine::SyncStatus::Running => SyncStatus::Running,
        max_engine::SyncStatus::Completed => SyncStatus::Completed,
        max_engine::SyncStatus::Failed => SyncStatus::Failed,
        max_engine::SyncStatus::Cancelled => SyncStatus::Cancelled,
    }
}

fn map_completion(completion: max_engine::SyncCompletion) -> SyncCompletion {
    SyncCompletion {
        status: map_status(completion.status),
        tasks_completed: completion.tasks_completed,
        tasks_failed: completion.tasks_failed,
        duration: completion.duration,
    }
}

/// An installed connector tenant (`spec.md` §4.8, GLOSSARY: Installation).
pub struct InstallationMax<C: Clock> {
    connector: Arc<dyn Connector>,
    installation: Arc<dyn Installation>,
    schema: Schema,
    engine: Arc<MemoryEngine>,
    store: Arc<TaskStore<C>>,
    executor: SyncExecutor<C>,
    syncs: Arc<Mutex<HashMap<SyncId, SyncHandle>>>,
    lifecycle: AutoLifecycle,
}

impl<C: Clock + 'static> InstallationMax<C> {
    pub fn new(
        connector: Arc<dyn Connector>,
        installation: Arc<dyn Installation>,
        sync_meta: Arc<dyn SyncMeta>,
        clock: C,
    ) -> Self {
        let schema = connector.schema().clone();
        let engine = Arc::new(MemoryEngine::new());
        let store = Arc::new(TaskStore::new(clock.clone()));
        let syncs: Arc<Mutex<HashMap<SyncId, SyncHandle>>> = Arc::new(Mutex::new(HashMap::new()));

        let runner = Arc::new(DefaultTaskRunner::new(
            connector.clone(),
            installation.clone(),
            engine.clone() as Arc<dyn Engine>,
            engine.clone() as Arc<dyn CollectionSink>,
            sync_meta,
            clock.clone(),
        ));
        let executor = SyncExecutor::new(store.clone(), runner, clock);

        let lifecycle = AutoLifecycle::new(vec![
            LifecycleEntry::node(Arc::new(NoopNode)),
            LifecycleEntry::node(Arc::new(NoopNode)),
            LifecycleEntry::node(Arc::new(ExecutorNode { store: store.clone(), syncs: syncs.clone() })),
        ]);

        Self { connector, installation, schema, engine, store, executor, syncs, lifecycle }
    }
}

#[async_trait]
impl<C: Clock + 'static> Supervised for InstallationMax<C> {
    async fn health(&self) -> HealthStatus {
        self.lifecycle.health().await
    }

    async fn start(&self) -> StartResult {
        self.lifecycle.start().await
    }

    async fn stop(&self) -> StopResult {
        self.lifecycle.stop().await
    }
}

#[async_trait]
impl<C: Clock + 'static> Engine for InstallationMax<C> {
    async fn load(&self, entity_ref: &Ref, projection: Projection) -> Result<EntityResult, MaxError> {
        self.engine.load(entity_ref, projection).await
    }

    async fn load_field(&self, entity_ref: &Ref, field: &str) -> Result<Value, MaxError> {
        self.engine.load_field(entity_ref, field).await
    }

    async fn load_collection(
        &self,
        entity_ref: &Ref,
        field: &str,
        page: PageRequest,
    ) -> Result<Page<Ref>, MaxError> {
        self.engine.load_collection(entity_ref, field, page).await
    }

    async fn store(&self, input: EntityInput) -> Result<Ref, MaxError> {
        self.engine.store(input).await
    }

    async fn load_page(
        &self,
        entity_type: &EntityTypeId,
        projection: Projection,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        self.engine.load_page(entity_type, projection, page).await
    }

    async fn query(
        &self,
        entity_type: &EntityTypeId,
        query: Query,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        self.engine.query(entity_type, query, page).await
    }
}

#[async_trait]
impl<C: Clock + 'static> InstallationClient for InstallationMax<C> {
    async fn describe(&self) -> Result<Value, MaxError> {
        Ok(json!({
            "connector": self.connector.name(),
            "config": self.installation.config(),
        }))
    }

    async fn schema(&self) -> Result<Schema, MaxError> {
        Ok(self.schema.clone())
    }

    async fn sync(&self) -> Result<SyncId, MaxError> {
        let plan = self.connector.seeder().seed(self.installation.as_ref(), &*self.engine).await?;
        let sync_id = SyncId::new();
        let handle = self.executor.execute(sync_id, plan);
        self.syncs.lock().insert(sync_id, handle);
        Ok(sync_id)
    }

    async fn sync_status(&self, sync_id: &SyncId) -> Result<SyncStatus, MaxError> {
        let handle = self.syncs.lock().get(sync_id).cloned();
        match handle {
            Some(handle) => Ok(map_status(handle.status())),
            None => Ok(SyncStatus::NotFound),
        }
    }

    async fn sync_pause(&self, sync_id: &SyncId) -> Result<(), MaxError> {
        let handle = self.syncs.lock().get(sync_id).cloned();
        match handle {
            Some(handle) => {
                handle.pause();
                Ok(())
            }
            None => Err(FederationError::SyncNotFound { sync_id: sync_id.to_string() }.into()),
        }
    }

    async fn sync_cancel(&self, sync_id: &SyncId) -> Result<(), MaxError> {
        let handle = self.syncs.lock().remove(sync_id);
        match handle {
            Some(handle) => {
                handle.cancel(&self.store);
                Ok(())
            }
            None => Err(FederationError::SyncNotFound { sync_id: sync_id.to_string() }.into()),
        }
    }

    async fn sync_completion(&self, sync_id: &SyncId) -> Result<SyncCompletion, MaxError> {
        let handle = self.syncs.lock().get(sync_id).cloned();
        match handle {
            Some(handle) => {
                let completion = handle.completion(&self.store).await;
                self.syncs.lock().remove(sync_id);
                Ok(map_completion(completion))
            }
            None => Ok(SyncCompletion {
                status: SyncStatus::NotFound,
                tasks_completed: 0,
                tasks_failed: 0,
                duration: DurationMs::ZERO,
            }),
        }
    }
}

#[cfg(test)]
#[path = "installation_tests.rs"]
mod tests;
