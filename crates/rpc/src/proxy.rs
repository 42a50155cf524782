// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller-side stubs: build a [`Request`], forward it over a [`Transport`],
//! and translate the [`Response`] back into a typed call (`spec.md` §4.4).

use std::sync::Arc;

use async_trait::async_trait;
use max_core::{
    Engine, EntityInput, EntityResult, EntityTypeId, HealthStatus, InstallationId, MaxError, Page,
    PageRequest, Projection, Query, Ref, Schema, StartResult, StopResult, Supervised, SyncId,
    WorkspaceId,
};
use max_wire::{Request, Transport};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::contracts::{
    GlobalClient, InstallationClient, InstallationConfig, InstallationSummary, SyncCompletion,
    SyncStatus, WorkspaceClient, WorkspaceSummary,
};

fn request_id() -> String {
    Uuid::new_v4().to_string()
}

fn to_value(value: impl serde::Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

async fn call(
    transport: &dyn Transport,
    target: &str,
    method: &str,
    args: Vec<Value>,
) -> Result<Value, MaxError> {
    let request = Request::new(request_id(), target, method).with_args(args);
    let response = transport.send(request).await.map_err(MaxError::from)?;
    response.into_result()
}

async fn decode<T: serde::de::DeserializeOwned>(
    transport: &dyn Transport,
    target: &str,
    method: &str,
    args: Vec<Value>,
) -> Result<T, MaxError> {
    let value = call(transport, target, method, args).await?;
    serde_json::from_value(value)
        .map_err(|e| MaxError::new("rpc.bad_response", format!("decoding {method} response: {e}")))
}

async fn health(transport: &dyn Transport, target: &str) -> HealthStatus {
    match decode(transport, target, "health", vec![]).await {
        Ok(status) => status,
        Err(error) => HealthStatus::unhealthy(error.message),
    }
}

async fn start(transport: &dyn Transport, target: &str) -> StartResult {
    match decode(transport, target, "start", vec![]).await {
        Ok(result) => result,
        Err(error) => StartResult::Error { error },
    }
}

async fn stop(transport: &dyn Transport, target: &str) -> StopResult {
    match decode(transport, target, "stop", vec![]).await {
        Ok(result) => result,
        Err(error) => StopResult::Error { error },
    }
}

/// Forwards `health/start/stop` over a [`Transport`] to target `""`.
pub struct SupervisedProxy {
    transport: Arc<dyn Transport>,
}

impl SupervisedProxy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Supervised for SupervisedProxy {
    async fn health(&self) -> HealthStatus {
        health(self.transport.as_ref(), "").await
    }

    async fn start(&self) -> StartResult {
        start(self.transport.as_ref(), "").await
    }

    async fn stop(&self) -> StopResult {
        stop(self.transport.as_ref(), "").await
    }
}

/// Forwards `load/loadField/loadCollection/store/loadPage/query` over a
/// [`Transport`] to target `"engine"`.
pub struct EngineProxy {
    transport: Arc<dyn Transport>,
}

impl EngineProxy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Engine for EngineProxy {
    async fn load(&self, entity_ref: &Ref, projection: Projection) -> Result<EntityResult, MaxError> {
        let args = vec![to_value(entity_ref), to_value(&projection)];
        decode(self.transport.as_ref(), "engine", "load", args).await
    }

    async fn load_field(&self, entity_ref: &Ref, field: &str) -> Result<Value, MaxError> {
        let args = vec![to_value(entity_ref), json!(field)];
        call(self.transport.as_ref(), "engine", "loadField", args).await
    }

    async fn load_collection(
        &self,
        entity_ref: &Ref,
        field: &str,
        page: PageRequest,
    ) -> Result<Page<Ref>, MaxError> {
        let args = vec![to_value(entity_ref), json!(field), to_value(&page)];
        decode(self.transport.as_ref(), "engine", "loadCollection", args).await
    }

    async fn store(&self, input: EntityInput) -> Result<Ref, MaxError> {
        let args = vec![to_value(&input)];
        decode(self.transport.as_ref(), "engine", "store", args).await
    }

    async fn load_page(
        &self,
        entity_type: &EntityTypeId,
        projection: Projection,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        let args =
            vec![json!(entity_type.as_ref()), to_value(&projection), to_value(&page)];
        decode(self.transport.as_ref(), "engine", "loadPage", args).await
    }

    async fn query(
        &self,
        entity_type: &EntityTypeId,
        query: Query,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        let args =
            vec![json!(entity_type.as_ref()), to_value(&query), to_value(&page)];
        decode(self.transport.as_ref(), "engine", "query", args).await
    }
}

/// Composes the `SupervisedProxy` surface with `describe/schema/sync*` over
/// target `""` (`spec.md` §4.4.3).
pub struct InstallationProxy {
    transport: Arc<dyn Transport>,
    engine: EngineProxy,
}

impl InstallationProxy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { engine: EngineProxy::new(transport.clone()), transport }
    }
}

#[async_trait]
impl Supervised for InstallationProxy {
    async fn health(&self) -> HealthStatus {
        health(self.transport.as_ref(), "").await
    }

    async fn start(&self) -> StartResult {
        start(self.transport.as_ref(), "").await
    }

    async fn stop(&self) -> StopResult {
        stop(self.transport.as_ref(), "").await
    }
}

#[async_trait]
impl Engine for InstallationProxy {
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
impl InstallationClient for InstallationProxy {
    async fn describe(&self) -> Result<Value, MaxError> {
        call(self.transport.as_ref(), "", "describe", vec![]).await
    }

    async fn schema(&self) -> Result<Schema, MaxError> {
        decode(self.transport.as_ref(), "", "schema", vec![]).await
    }

    async fn sync(&self) -> Result<SyncId, MaxError> {
        let value = call(self.transport.as_ref(), "", "sync", vec![]).await?;
        let id: String = serde_json::from_value(value)
            .map_err(|e| MaxError::new("rpc.bad_response", e.to_string()))?;
        Ok(SyncId::from_string(id))
    }

    async fn sync_status(&self, sync_id: &SyncId) -> Result<SyncStatus, MaxError> {
        decode(self.transport.as_ref(), "", "syncStatus", vec![json!(sync_id.as_ref())]).await
    }

    async fn sync_pause(&self, sync_id: &SyncId) -> Result<(), MaxError> {
        call(self.transport.as_ref(), "", "syncPause", vec![json!(sync_id.as_ref())]).await?;
        Ok(())
    }

    async fn sync_cancel(&self, sync_id: &SyncId) -> Result<(), MaxError> {
        call(self.transport.as_ref(), "", "syncCancel", vec![json!(sync_id.as_ref())]).await?;
        Ok(())
    }

    async fn sync_completion(&self, sync_id: &SyncId) -> Result<SyncCompletion, MaxError> {
        decode(self.transport.as_ref(), "", "syncCompletion", vec![json!(sync_id.as_ref())]).await
    }
}

/// Forwards workspace-level ops over a [`Transport`] to target `""`
/// (`spec.md` §4.4.4).
pub struct WorkspaceProxy {
    transport: Arc<dyn Transport>,
}

impl WorkspaceProxy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// An [`InstallationProxy`] whose requests are automatically scoped to
    /// `installation_id` at this workspace's endpoint (`spec.md` §4.3).
    pub fn installation(&self, installation_id: InstallationId) -> InstallationProxy {
        let scoped = max_wire::ScopedTransport::new(
            self.transport.clone(),
            max_wire::RequestScope { workspace_id: None, installation_id: Some(installation_id.to_string()) },
        );
        InstallationProxy::new(Arc::new(scoped))
    }
}

#[async_trait]
impl Supervised for WorkspaceProxy {
    async fn health(&self) -> HealthStatus {
        health(self.transport.as_ref(), "").await
    }

    async fn start(&self) -> StartResult {
        start(self.transport.as_ref(), "").await
    }

    async fn stop(&self) -> StopResult {
        stop(self.transport.as_ref(), "").await
    }
}

#[async_trait]
impl WorkspaceClient for WorkspaceProxy {
    async fn list_installations(&self) -> Result<Vec<InstallationSummary>, MaxError> {
        decode(self.transport.as_ref(), "", "listInstallations", vec![]).await
    }

    async fn create_installation(&self, config: InstallationConfig) -> Result<InstallationId, MaxError> {
        let value = call(self.transport.as_ref(), "", "createInstallation", vec![to_value(&config)])
            .await?;
        let id: String = serde_json::from_value(value)
            .map_err(|e| MaxError::new("rpc.bad_response", e.to_string()))?;
        Ok(InstallationId::from_string(id))
    }

    async fn connect_installation(&self, config: InstallationConfig) -> Result<InstallationId, MaxError> {
        let value =
            call(self.transport.as_ref(), "", "connectInstallation", vec![to_value(&config)])
                .await?;
        let id: String = serde_json::from_value(value)
            .map_err(|e| MaxError::new("rpc.bad_response", e.to_string()))?;
        Ok(InstallationId::from_string(id))
    }

    async fn remove_installation(&self, id: &InstallationId) -> Result<(), MaxError> {
        call(self.transport.as_ref(), "", "removeInstallation", vec![json!(id.as_ref())]).await?;
        Ok(())
    }

    async fn list_connectors(&self) -> Result<Vec<String>, MaxError> {
        decode(self.transport.as_ref(), "", "listConnectors", vec![]).await
    }

    async fn connector_schema(&self, connector: &str) -> Result<Schema, MaxError> {
        decode(self.transport.as_ref(), "", "connectorSchema", vec![json!(connector)]).await
    }

    async fn connector_onboarding(&self, connector: &str) -> Result<Value, MaxError> {
        call(self.transport.as_ref(), "", "connectorOnboarding", vec![json!(connector)]).await
    }
}

/// Forwards global-level ops over a [`Transport`] to target `""`
/// (`spec.md` §4.4.5).
pub struct GlobalProxy {
    transport: Arc<dyn Transport>,
}

impl GlobalProxy {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// A [`WorkspaceProxy`] whose requests are automatically scoped to
    /// `workspace_id` at this global node's endpoint.
    pub fn workspace(&self, workspace_id: WorkspaceId) -> WorkspaceProxy {
        let scoped = max_wire::ScopedTransport::new(
            self.transport.clone(),
            max_wire::RequestScope { workspace_id: Some(workspace_id.to_string()), installation_id: None },
        );
        WorkspaceProxy::new(Arc::new(scoped))
    }
}

#[async_trait]
impl Supervised for GlobalProxy {
    async fn health(&self) -> HealthStatus {
        health(self.transport.as_ref(), "").await
    }

    async fn start(&self) -> StartResult {
        start(self.transport.as_ref(), "").await
    }

    async fn stop(&self) -> StopResult {
        stop(self.transport.as_ref(), "").await
    }
}

#[async_trait]
impl GlobalClient for GlobalProxy {
    async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>, MaxError> {
        decode(self.transport.as_ref(), "", "listWorkspaces", vec![]).await
    }

    async fn create_workspace(&self, name: &str, project_root: &str) -> Result<WorkspaceId, MaxError> {
        let value = call(
            self.transport.as_ref(),
            "",
            "createWorkspace",
            vec![json!(name), json!(project_root)],
        )
        .await?;
        let id: String = serde_json::from_value(value)
            .map_err(|e| MaxError::new("rpc.bad_response", e.to_string()))?;
        Ok(WorkspaceId::from_string(id))
    }

    async fn remove_workspace(&self, id: &WorkspaceId) -> Result<(), MaxError> {
        call(self.transport.as_ref(), "", "removeWorkspace", vec![json!(id.as_ref())]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
