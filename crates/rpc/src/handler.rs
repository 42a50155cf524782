// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Receiver-side stubs: dispatch a method name to the real implementation
//! (`spec.md` §4.4).

use std::sync::Arc;

use async_trait::async_trait;
use max_core::{Engine, EntityInput, MaxError, PageRequest, Projection, Query, Ref, Supervised};
use serde_json::Value;

use crate::contracts::{
    arg, entity_type_arg, health_to_value, start_to_value, stop_to_value, GlobalClient,
    InstallationClient, InstallationConfig, WorkspaceClient,
};
use crate::dispatcher::Handler;
use crate::errors::RpcError;

fn unknown_method(target: &str, method: &str) -> MaxError {
    RpcError::UnknownMethod { target: target.to_string(), method: method.to_string() }.into()
}

/// Target `""`: `health`/`start`/`stop`.
pub struct SupervisedHandler {
    node: Arc<dyn Supervised>,
}

impl SupervisedHandler {
    pub fn new(node: Arc<dyn Supervised>) -> Self {
        Self { node }
    }
}

#[async_trait]
impl Handler for SupervisedHandler {
    async fn call(&self, method: &str, _args: Vec<Value>) -> Result<Value, MaxError> {
        match method {
            "health" => Ok(health_to_value(self.node.health().await)),
            "start" => Ok(start_to_value(self.node.start().await)),
            "stop" => Ok(stop_to_value(self.node.stop().await)),
            other => Err(unknown_method("", other)),
        }
    }
}

/// Target `"engine"`: `load/loadField/loadCollection/store/loadPage/query`.
pub struct EngineHandler {
    engine: Arc<dyn Engine>,
}

impl EngineHandler {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Handler for EngineHandler {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MaxError> {
        match method {
            "load" => {
                let entity_ref: Ref = arg(&args, 0)?;
                let projection: Projection = arg(&args, 1)?;
                let result = self.engine.load(&entity_ref, projection).await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "loadField" => {
                let entity_ref: Ref = arg(&args, 0)?;
                let field: String = arg(&args, 1)?;
                self.engine.load_field(&entity_ref, &field).await
            }
            "loadCollection" => {
                let entity_ref: Ref = arg(&args, 0)?;
                let field: String = arg(&args, 1)?;
                let page: PageRequest = arg(&args, 2)?;
                let result = self.engine.load_collection(&entity_ref, &field, page).await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "store" => {
                let input: EntityInput = arg(&args, 0)?;
                let result = self.engine.store(input).await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "loadPage" => {
                let entity_type = entity_type_arg(&args, 0)?;
                let projection: Projection = arg(&args, 1)?;
                let page: PageRequest = arg(&args, 2)?;
                let result = self.engine.load_page(&entity_type, projection, page).await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "query" => {
                let entity_type = entity_type_arg(&args, 0)?;
                let query: Query = arg(&args, 1)?;
                let page: PageRequest = arg(&args, 2)?;
                let result = self.engine.query(&entity_type, query, page).await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            other => Err(unknown_method("engine", other)),
        }
    }
}

/// Composes [`SupervisedHandler`]-equivalent dispatch with
/// `describe/schema/sync*`, for target `""` on an installation node.
pub struct InstallationHandler {
    installation: Arc<dyn InstallationClient>,
}

impl InstallationHandler {
    pub fn new(installation: Arc<dyn InstallationClient>) -> Self {
        Self { installation }
    }
}

#[async_trait]
impl Handler for InstallationHandler {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MaxError> {
        match method {
            "health" => Ok(health_to_value(self.installation.health().await)),
            "start" => Ok(start_to_value(self.installation.start().await)),
            "stop" => Ok(stop_to_value(self.installation.stop().await)),
            "describe" => self.installation.describe().await,
            "schema" => {
                let schema = self.installation.schema().await?;
                Ok(serde_json::to_value(schema).unwrap_or(Value::Null))
            }
            "sync" => {
                let sync_id = self.installation.sync().await?;
                Ok(Value::String(sync_id.to_string()))
            }
            "syncStatus" => {
                let sync_id = arg(&args, 0)?;
                let status = self.installation.sync_status(&sync_id).await?;
                Ok(serde_json::to_value(status).unwrap_or(Value::Null))
            }
            "syncPause" => {
                let sync_id = arg(&args, 0)?;
                self.installation.sync_pause(&sync_id).await?;
                Ok(Value::Null)
            }
            "syncCancel" => {
                let sync_id = arg(&args, 0)?;
                self.installation.sync_cancel(&sync_id).await?;
                Ok(Value::Null)
            }
            "syncCompletion" => {
                let sync_id = arg(&args, 0)?;
                let completion = self.installation.sync_completion(&sync_id).await?;
                Ok(serde_json::to_value(completion).unwrap_or(Value::Null))
            }
            other => Err(unknown_method("", other)),
        }
    }
}

/// Target `""` on a workspace node: Supervised + workspace ops. The
/// `installation(id)` sub-lookup is not a dispatched method — it's a
/// scope-routing concern handled by `Dispatcher`'s `InstallationRouter`.
pub struct WorkspaceHandler {
    workspace: Arc<dyn WorkspaceClient>,
}

impl WorkspaceHandler {
    pub fn new(workspace: Arc<dyn WorkspaceClient>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Handler for WorkspaceHandler {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MaxError> {
        match method {
            "health" => Ok(health_to_value(self.workspace.health().await)),
            "start" => Ok(start_to_value(self.workspace.start().await)),
            "stop" => Ok(stop_to_value(self.workspace.stop().await)),
            "listInstallations" => {
                let result = self.workspace.list_installations().await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "createInstallation" => {
                let config: InstallationConfig = arg(&args, 0)?;
                let id = self.workspace.create_installation(config).await?;
                Ok(Value::String(id.to_string()))
            }
            "connectInstallation" => {
                let config: InstallationConfig = arg(&args, 0)?;
                let id = self.workspace.connect_installation(config).await?;
                Ok(Value::String(id.to_string()))
            }
            "removeInstallation" => {
                let id = arg(&args, 0)?;
                self.workspace.remove_installation(&id).await?;
                Ok(Value::Null)
            }
            "listConnectors" => {
                let result = self.workspace.list_connectors().await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "connectorSchema" => {
                let connector: String = arg(&args, 0)?;
                let schema = self.workspace.connector_schema(&connector).await?;
                Ok(serde_json::to_value(schema).unwrap_or(Value::Null))
            }
            "connectorOnboarding" => {
                let connector: String = arg(&args, 0)?;
                self.workspace.connector_onboarding(&connector).await
            }
            other => Err(unknown_method("", other)),
        }
    }
}

/// Target `""` on a global node: Supervised + one level of workspace
/// bookkeeping (`spec.md` §4.4.5). The `workspace(id)` sub-lookup, like
/// `WorkspaceHandler`'s installation lookup, is scope routing rather than
/// a dispatched method.
pub struct GlobalHandler {
    global: Arc<dyn GlobalClient>,
}

impl GlobalHandler {
    pub fn new(global: Arc<dyn GlobalClient>) -> Self {
        Self { global }
    }
}

#[async_trait]
impl Handler for GlobalHandler {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MaxError> {
        match method {
            "health" => Ok(health_to_value(self.global.health().await)),
            "start" => Ok(start_to_value(self.global.start().await)),
            "stop" => Ok(stop_to_value(self.global.stop().await)),
            "listWorkspaces" => {
                let result = self.global.list_workspaces().await?;
                Ok(serde_json::to_value(result).unwrap_or(Value::Null))
            }
            "createWorkspace" => {
                let name: String = arg(&args, 0)?;
                let project_root: String = arg(&args, 1)?;
                let id = self.global.create_workspace(&name, &project_root).await?;
                Ok(Value::String(id.to_string()))
            }
            "removeWorkspace" => {
                let id = arg(&args, 0)?;
                self.global.remove_workspace(&id).await?;
                Ok(Value::Null)
            }
            other => Err(unknown_method("", other)),
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
