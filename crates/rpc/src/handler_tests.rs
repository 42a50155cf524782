use std::sync::Arc;

use async_trait::async_trait;
use max_core::{
    EntityId, EntityInput, EntityResult, EntityTypeId, HealthStatus, MaxError, Page, PageRequest,
    Projection, Query, Ref, Scope, Schema, StartResult, StopResult, Supervised, SyncId,
};
use serde_json::json;

use super::*;
use crate::contracts::{InstallationClient, SyncCompletion, SyncStatus};

struct FakeSupervised;

#[async_trait]
impl Supervised for FakeSupervised {
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

#[tokio::test]
async fn supervised_handler_dispatches_lifecycle_methods() {
    let handler = SupervisedHandler::new(Arc::new(FakeSupervised));
    assert_eq!(handler.call("health", vec![]).await.unwrap(), json!({"kind": "healthy"}));
    assert_eq!(handler.call("start", vec![]).await.unwrap(), json!({"kind": "started"}));
    assert_eq!(handler.call("stop", vec![]).await.unwrap(), json!({"kind": "stopped"}));
}

#[tokio::test]
async fn supervised_handler_rejects_unknown_method() {
    let handler = SupervisedHandler::new(Arc::new(FakeSupervised));
    let err = handler.call("frobnicate", vec![]).await.unwrap_err();
    assert_eq!(err.code, "rpc.unknown_method");
}

struct FakeEngine;

#[async_trait]
impl max_core::Engine for FakeEngine {
    async fn load(&self, entity_ref: &Ref, _projection: Projection) -> Result<EntityResult, MaxError> {
        Ok(EntityResult { entity_ref: entity_ref.clone(), fields: Default::default() })
    }

    async fn load_field(&self, _entity_ref: &Ref, _field: &str) -> Result<serde_json::Value, MaxError> {
        Ok(json!("value"))
    }

    async fn load_collection(
        &self,
        _entity_ref: &Ref,
        _field: &str,
        _page: PageRequest,
    ) -> Result<Page<Ref>, MaxError> {
        Ok(Page::last(vec![]))
    }

    async fn store(&self, input: EntityInput) -> Result<Ref, MaxError> {
        Ok(input.entity_ref)
    }

    async fn load_page(
        &self,
        _entity_type: &EntityTypeId,
        _projection: Projection,
        _page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        Ok(Page::last(vec![]))
    }

    async fn query(
        &self,
        _entity_type: &EntityTypeId,
        _query: Query,
        _page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        Ok(Page::last(vec![]))
    }
}

fn sample_ref() -> Ref {
    Ref::new(EntityTypeId::from_string("typ-person"), EntityId::from_string("ent-1"), Scope::Installation)
}

#[tokio::test]
async fn engine_handler_routes_load_field() {
    let handler = EngineHandler::new(Arc::new(FakeEngine));
    let args = vec![serde_json::to_value(sample_ref()).unwrap(), json!("name")];
    let result = handler.call("loadField", args).await.unwrap();
    assert_eq!(result, json!("value"));
}

#[tokio::test]
async fn engine_handler_rejects_unknown_method() {
    let handler = EngineHandler::new(Arc::new(FakeEngine));
    let err = handler.call("delete", vec![]).await.unwrap_err();
    assert_eq!(err.code, "rpc.unknown_method");
}

struct FakeInstallation;

#[async_trait]
impl Supervised for FakeInstallation {
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

#[async_trait]
impl max_core::Engine for FakeInstallation {
    async fn load(&self, entity_ref: &Ref, _projection: Projection) -> Result<EntityResult, MaxError> {
        Ok(EntityResult { entity_ref: entity_ref.clone(), fields: Default::default() })
    }
    async fn load_field(&self, _entity_ref: &Ref, _field: &str) -> Result<serde_json::Value, MaxError> {
        Ok(json!(null))
    }
    async fn load_collection(
        &self,
        _entity_ref: &Ref,
        _field: &str,
        _page: PageRequest,
    ) -> Result<Page<Ref>, MaxError> {
        Ok(Page::last(vec![]))
    }
    async fn store(&self, input: EntityInput) -> Result<Ref, MaxError> {
        Ok(input.entity_ref)
    }
    async fn load_page(
        &self,
        _entity_type: &EntityTypeId,
        _projection: Projection,
        _page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        Ok(Page::last(vec![]))
    }
    async fn query(
        &self,
        _entity_type: &EntityTypeId,
        _query: Query,
        _page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        Ok(Page::last(vec![]))
    }
}

#[async_trait]
impl InstallationClient for FakeInstallation {
    async fn describe(&self) -> Result<serde_json::Value, MaxError> {
        Ok(json!({"connector": "fake"}))
    }

    async fn schema(&self) -> Result<Schema, MaxError> {
        Ok(Schema::new("fake"))
    }

    async fn sync(&self) -> Result<SyncId, MaxError> {
        Ok(SyncId::from_string("syn-1"))
    }

    async fn sync_status(&self, _sync_id: &SyncId) -> Result<SyncStatus, MaxError> {
        Ok(SyncStatus::Running)
    }

    async fn sync_pause(&self, _sync_id: &SyncId) -> Result<(), MaxError> {
        Ok(())
    }

    async fn sync_cancel(&self, _sync_id: &SyncId) -> Result<(), MaxError> {
        Ok(())
    }

    async fn sync_completion(&self, _sync_id: &SyncId) -> Result<SyncCompletion, MaxError> {
        Ok(SyncCompletion {
            status: SyncStatus::Completed,
            tasks_completed: 3,
            tasks_failed: 0,
            duration: max_core::DurationMs(100),
        })
    }
}

#[tokio::test]
async fn installation_handler_routes_describe_and_sync() {
    let handler = InstallationHandler::new(Arc::new(FakeInstallation));
    let described = handler.call("describe", vec![]).await.unwrap();
    assert_eq!(described, json!({"connector": "fake"}));

    let sync_id = handler.call("sync", vec![]).await.unwrap();
    assert_eq!(sync_id, json!("syn-1"));

    let completion = handler
        .call("syncCompletion", vec![json!("syn-1")])
        .await
        .unwrap();
    assert_eq!(completion["tasks_completed"].as_u64().unwrap_or_default(), 3);
}

#[tokio::test]
async fn installation_handler_rejects_unknown_method() {
    let handler = InstallationHandler::new(Arc::new(FakeInstallation));
    let err = handler.call("nope", vec![]).await.unwrap_err();
    assert_eq!(err.code, "rpc.unknown_method");
}
