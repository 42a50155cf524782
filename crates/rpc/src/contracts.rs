// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The interfaces that cross an RPC boundary (`spec.md` §4.4), beyond the
//! already-shared [`max_core::Supervised`] and [`max_core::Engine`]:
//! `InstallationClient`, `WorkspaceClient`, `GlobalClient`. Each gets a
//! proxy (`crate::proxy`) and a handler (`crate::handler`).

use async_trait::async_trait;
use max_core::{
    DurationMs, Engine, EntityTypeId, HealthStatus, InstallationId, MaxError, Schema, StartResult,
    StopResult, Supervised, SyncId, WorkspaceId,
};
use serde_json::Value;

/// Closed-variant status of a running or settled sync (`spec.md` §4.11).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
    /// No sync is running under this id (never started, or already reaped
    /// after settling).
    NotFound,
}

/// `completion()`'s return shape (`spec.md` §4.11).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyncCompletion {
    pub status: SyncStatus,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub duration: DurationMs,
}

/// `createInstallation`/`connectInstallation` config (`spec.md` §4.8): the
/// deployer `strategy` is the discriminant, so this stays a loosely typed
/// envelope rather than a closed enum — deployer kinds are a `max-
/// federation` concern, not an RPC-plane one.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstallationConfig {
    pub connector: String,
    pub name: String,
    pub strategy: String,
    #[serde(default)]
    pub config: Value,
}

/// Projection of an installation registry entry (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstallationSummary {
    pub id: InstallationId,
    pub connector: String,
    pub name: String,
    pub connected_at: DurationMs,
}

/// A connector available to a workspace's connector registry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConnectorSummary {
    pub name: String,
    pub schema: Schema,
}

/// Supervised + Engine + `describe/schema/sync` (`spec.md` §4.4.3). Sync
/// operations take `syncId` as their first argument once a sync has
/// started.
#[async_trait]
pub trait InstallationClient: Supervised + Engine {
    async fn describe(&self) -> Result<Value, MaxError>;
    async fn schema(&self) -> Result<Schema, MaxError>;
    async fn sync(&self) -> Result<SyncId, MaxError>;
    async fn sync_status(&self, sync_id: &SyncId) -> Result<SyncStatus, MaxError>;
    async fn sync_pause(&self, sync_id: &SyncId) -> Result<(), MaxError>;
    async fn sync_cancel(&self, sync_id: &SyncId) -> Result<(), MaxError>;
    async fn sync_completion(&self, sync_id: &SyncId) -> Result<SyncCompletion, MaxError>;
}

/// Supervised + workspace ops + an installation sub-lookup (`spec.md`
/// §4.4.4).
#[async_trait]
pub trait WorkspaceClient: Supervised {
    async fn list_installations(&self) -> Result<Vec<InstallationSummary>, MaxError>;
    async fn create_installation(&self, config: InstallationConfig) -> Result<InstallationId, MaxError>;
    async fn connect_installation(&self, config: InstallationConfig) -> Result<InstallationId, MaxError>;
    async fn remove_installation(&self, id: &InstallationId) -> Result<(), MaxError>;
    async fn list_connectors(&self) -> Result<Vec<String>, MaxError>;
    async fn connector_schema(&self, connector: &str) -> Result<Schema, MaxError>;
    async fn connector_onboarding(&self, connector: &str) -> Result<Value, MaxError>;
}

/// Supervised + workspace ops, one level up (`spec.md` §4.4.5). Shares
/// `WorkspaceClient`'s workspace-facing method set one level up the
/// hierarchy; the handle it hangs off is a workspace rather than an
/// installation.
#[async_trait]
pub trait GlobalClient: Supervised {
    async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>, MaxError>;
    async fn create_workspace(&self, name: &str, project_root: &str) -> Result<WorkspaceId, MaxError>;
    async fn remove_workspace(&self, id: &WorkspaceId) -> Result<(), MaxError>;
}

/// Projection of a workspace manifest entry (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WorkspaceSummary {
    pub id: WorkspaceId,
    pub name: String,
    pub project_root: String,
    pub connected_at: DurationMs,
}

pub(crate) fn arg<T: serde::de::DeserializeOwned>(args: &[Value], index: usize) -> Result<T, MaxError> {
    let value = args.get(index).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| MaxError::new("rpc.bad_args", format!("argument {index}: {e}")))
}

pub(crate) fn entity_type_arg(args: &[Value], index: usize) -> Result<EntityTypeId, MaxError> {
    let s: String = arg(args, index)?;
    Ok(EntityTypeId::from_string(s))
}

pub(crate) fn health_to_value(health: HealthStatus) -> Value {
    serde_json::to_value(health).unwrap_or(Value::Null)
}

pub(crate) fn start_to_value(result: StartResult) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}

pub(crate) fn stop_to_value(result: StopResult) -> Value {
    serde_json::to_value(result).unwrap_or(Value::Null)
}
