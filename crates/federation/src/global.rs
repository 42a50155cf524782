// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GlobalMax`: the same shape as `WorkspaceMax` one level up (`spec.md`
//! §4.8). `GlobalClient::create_workspace` has no deployer-kind parameter of
//! its own, so this node always provisions through its `in-process`
//! deployer — the only kind a workspace manifest entry in this
//! implementation records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use max_connector::Connector;
use max_core::{Clock, DurationMs, HealthStatus, MaxError, StartResult, StopResult, Supervised, WorkspaceId};
use max_rpc::contracts::{GlobalClient, WorkspaceClient, WorkspaceSummary};
use max_storage::{WorkspaceManifest, WorkspaceRecord};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::error;

use crate::deployer::{Deployer, DeployerKind, UnlabelledHandle};
use crate::errors::FederationError;
use crate::supervisor::Supervisor;
use crate::workspace::InstallationDeployer;

/// What a workspace [`Deployer`] needs to build or reattach a `WorkspaceMax`.
pub struct WorkspaceSpec {
    pub connectors: Vec<Arc<dyn Connector>>,
    pub installation_deployers: Vec<Arc<InstallationDeployer>>,
}

/// The trait-object surface a workspace deployer produces.
pub type WorkspaceDeployer = dyn Deployer<Arc<dyn WorkspaceClient>, WorkspaceSpec>;

struct Locator {
    deployer_kind: DeployerKind,
    config: Value,
}

/// A workspace supervisor plus the registries that recreate it (`spec.md`
/// §4.8). `workspace(id)` is a synchronous in-process lookup, the same
/// scope-routing-is-not-a-dispatched-method treatment `WorkspaceMax` gives
/// `installation(id)` (`spec.md` §4.4.4/§4.4.5).
pub struct GlobalMax<C: Clock> {
    workspaces: Supervisor<Arc<dyn WorkspaceClient>, WorkspaceId>,
    manifest: Arc<WorkspaceManifest>,
    connectors: Vec<Arc<dyn Connector>>,
    installation_deployers: Vec<Arc<InstallationDeployer>>,
    deployers: HashMap<DeployerKind, Arc<WorkspaceDeployer>>,
    locators: Mutex<HashMap<WorkspaceId, Locator>>,
    clock: C,
}

impl<C: Clock + 'static> GlobalMax<C> {
    pub fn new(
        manifest: Arc<WorkspaceManifest>,
        connectors: Vec<Arc<dyn Connector>>,
        installation_deployers: Vec<Arc<InstallationDeployer>>,
        workspace_deployers: Vec<Arc<WorkspaceDeployer>>,
        clock: C,
    ) -> Self {
        Self {
            workspaces: Supervisor::new(WorkspaceId::new),
            manifest,
            connectors,
            installation_deployers,
            deployers: workspace_deployers.into_iter().map(|d| (d.kind(), d)).collect(),
            locators: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Synchronous lookup of a live workspace by id.
    pub fn workspace(&self, id: &WorkspaceId) -> Option<Arc<dyn WorkspaceClient>> {
        self.workspaces.get(id)
    }

    fn deployer(&self, kind: DeployerKind) -> Result<Arc<WorkspaceDeployer>, MaxError> {
        self.deployers
            .get(&kind)
            .cloned()
            .ok_or_else(|| FederationError::UnknownDeployerKind { kind: kind.to_string() }.into())
    }

    fn spec(&self) -> WorkspaceSpec {
        WorkspaceSpec {
            connectors: self.connectors.clone(),
            installation_deployers: self.installation_deployers.clone(),
        }
    }

    /// Rebuild every persisted workspace on startup (`spec.md` §4.8:
    /// "Eagerly reconciles persisted workspaces on startup").
    pub async fn reconcile(&self) -> Result<(), MaxError> {
        let deployer = self.deployer(DeployerKind::InProcess)?;
        for record in self.manifest.list() {
            let config = json!({"name": record.name, "project_root": record.project_root});
            let handle = deployer.connect(config.clone(), self.spec()).await?;
            self.workspaces.register(handle.client.clone(), Some(record.id));
            self.locators.lock().insert(record.id, Locator { deployer_kind: handle.deployer_kind, config });
            handle.client.start().await;
        }
        Ok(())
    }

    async fn place(
        &self,
        name: &str,
        project_root: &str,
        handle: UnlabelledHandle<Arc<dyn WorkspaceClient>>,
    ) -> Result<WorkspaceId, MaxError> {
        let id = self.workspaces.register(handle.client.clone(), None);
        self.locators.lock().insert(
            id,
            Locator { deployer_kind: handle.deployer_kind, config: json!({"name": name, "project_root": project_root}) },
        );
        self.manifest.insert(WorkspaceRecord {
            id,
            name: name.to_string(),
            project_root: project_root.to_string(),
            connected_at: DurationMs(self.clock.epoch_ms()),
        });
        handle.client.start().await;
        Ok(id)
    }
}

#[async_trait]
impl<C: Clock + 'static> Supervised for GlobalMax<C> {
    async fn health(&self) -> HealthStatus {
        self.workspaces.health().await
    }

    async fn start(&self) -> StartResult {
        for handle in self.workspaces.list() {
            if let StartResult::Error { error } = handle.node.start().await {
                error!(workspace_id = %handle.id, %error, "workspace failed to start");
            }
        }
        StartResult::Started
    }

    async fn stop(&self) -> StopResult {
        for handle in self.workspaces.list().into_iter().rev() {
            if let StopResult::Error { error } = handle.node.stop().await {
                error!(workspace_id = %handle.id, %error, "workspace failed to stop");
            }
        }
        StopResult::Stopped
    }
}

#[async_trait]
impl<C: Clock + 'static> GlobalClient for GlobalMax<C> {
    async fn list_workspaces(&self) -> Result<Vec<WorkspaceSummary>, MaxError> {
        Ok(self
            .manifest
            .list()
            .into_iter()
            .map(|r| WorkspaceSummary {
                id: r.id,
                name: r.name,
                project_root: r.project_root,
                connected_at: r.connected_at,
            })
            .collect())
    }

    async fn create_workspace(&self, name: &str, project_root: &str) -> Result<WorkspaceId, MaxError> {
        let deployer = self.deployer(DeployerKind::InProcess)?;
        let config = json!({"name": name, "project_root": project_root});
        let handle = deployer.create(config, self.spec()).await?;
        self.place(name, project_root, handle).await
    }

    async fn remove_workspace(&self, id: &WorkspaceId) -> Result<(), MaxError> {
        self.workspaces.unregister(id);
        self.manifest.remove(id)?;

        if let Some(locator) = self.locators.lock().remove(id) {
            if let Ok(deployer) = self.deployer(locator.deployer_kind) {
                deployer.teardown(locator.config, self.spec()).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "global_tests.rs"]
mod tests;
