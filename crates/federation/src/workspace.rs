// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkspaceMax`: an installation supervisor plus the registries that let
//! it recreate what it supervises (`spec.md` §4.8).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use max_connector::Connector;
use max_core::{
    Clock, DurationMs, Engine, HealthStatus, InstallationId, MaxError, Schema, StartResult, StopResult,
    Supervised,
};
use max_rpc::contracts::{InstallationClient, InstallationConfig, InstallationSummary, WorkspaceClient};
use max_rpc::dispatcher::{Dispatcher, InstallationRouter};
use max_rpc::handler::{EngineHandler, InstallationHandler};
use max_storage::{InstallationRecord, InstallationRegistry};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{error, info};

use crate::deployer::{Deployer, DeployerKind};
use crate::errors::FederationError;
use crate::supervisor::Supervisor;

/// What an installation [`Deployer`] needs beyond `(config, spec)`'s raw
/// config value to build or reattach to an installation node.
pub struct InstallationSpec {
    pub connector: Arc<dyn Connector>,
}

/// A deployer's product for an installation node: both trait-object views
/// a caller needs, coerced from the same concrete node so no trait
/// upcasting between `dyn InstallationClient` and `dyn Engine` is required.
#[derive(Clone)]
pub struct InstallationHandle {
    pub client: Arc<dyn InstallationClient>,
    pub engine: Arc<dyn Engine>,
}

#[async_trait]
impl Supervised for InstallationHandle {
    async fn health(&self) -> HealthStatus {
        self.client.health().await
    }

    async fn start(&self) -> StartResult {
        self.client.start().await
    }

    async fn stop(&self) -> StopResult {
        self.client.stop().await
    }
}

/// The trait-object surface a deployer produces: enough to both register in
/// the supervisor and wrap in a per-installation [`Dispatcher`].
pub type InstallationDeployer = dyn Deployer<InstallationHandle, InstallationSpec>;

/// Deployment metadata kept alongside the live handle so `removeInstallation`
/// can hand the deployer back its own `(config, spec)` for teardown.
struct Locator {
    deployer_kind: DeployerKind,
    config: Value,
    connector: String,
}

/// An installation supervisor plus the registries that recreate it
/// (`spec.md` §4.8).
pub struct WorkspaceMax<C: Clock> {
    installations: Supervisor<InstallationHandle, InstallationId>,
    registry: Arc<InstallationRegistry>,
    connectors: HashMap<String, Arc<dyn Connector>>,
    deployers: HashMap<DeployerKind, Arc<InstallationDeployer>>,
    locators: Mutex<HashMap<InstallationId, Locator>>,
    dispatchers: Mutex<HashMap<String, Arc<Dispatcher>>>,
    clock: C,
}

impl<C: Clock + 'static> WorkspaceMax<C> {
    pub fn new(
        registry: Arc<InstallationRegistry>,
        connectors: Vec<Arc<dyn Connector>>,
        deployers: Vec<Arc<InstallationDeployer>>,
        clock: C,
    ) -> Self {
        Self {
            installations: Supervisor::new(InstallationId::new),
            registry,
            connectors: connectors.into_iter().map(|c| (c.name().to_string(), c)).collect(),
            deployers: deployers.into_iter().map(|d| (d.kind(), d)).collect(),
            locators: Mutex::new(HashMap::new()),
            dispatchers: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Synchronous lookup of a live installation by id.
    pub fn installation(&self, id: &InstallationId) -> Option<Arc<dyn InstallationClient>> {
        self.installations.get(id).map(|h| h.client)
    }

    fn connector(&self, name: &str) -> Result<Arc<dyn Connector>, MaxError> {
        self.connectors
            .get(name)
            .cloned()
            .ok_or_else(|| FederationError::UnknownConnector { connector: name.to_string() }.into())
    }

    fn deployer(&self, kind: DeployerKind) -> Result<Arc<InstallationDeployer>, MaxError> {
        self.deployers
            .get(&kind)
            .cloned()
            .ok_or_else(|| FederationError::UnknownDeployerKind { kind: kind.to_string() }.into())
    }

    fn is_duplicate(&self, connector: &str, name: &str) -> bool {
        self.registry.list().iter().any(|r| r.connector == connector && r.name == name)
    }

    async fn place(
        &self,
        config: InstallationConfig,
        handle: crate::deployer::UnlabelledHandle<InstallationHandle>,
    ) -> Result<InstallationId, MaxError> {
        let id = self.installations.register(handle.client.clone(), None);
        self.locators.lock().insert(
            id,
            Locator {
                deployer_kind: handle.deployer_kind,
                config: config.config.clone(),
                connector: config.connector.clone(),
            },
        );
        self.registry.insert(InstallationRecord {
            id,
            connector: config.connector,
            name: config.name,
            connected_at: DurationMs(self.clock.epoch_ms()),
        });
        handle.client.start().await;
        Ok(id)
    }
}

#[async_trait]
impl<C: Clock + 'static> Supervised for WorkspaceMax<C> {
    async fn health(&self) -> HealthStatus {
        self.installations.health().await
    }

    /// Starts every installation in registration order. Failures are
    /// logged, not propagated; aggregate health reports them (`spec.md`
    /// §4.8).
    async fn start(&self) -> StartResult {
        for handle in self.installations.list() {
            if let StartResult::Error { error } = handle.node.start().await {
                error!(installation_id = %handle.id, %error, "installation failed to start");
            }
        }
        StartResult::Started
    }

    /// Stops every installation in reverse registration order.
    async fn stop(&self) -> StopResult {
        for handle in self.installations.list().into_iter().rev() {
            if let StopResult::Error { error } = handle.node.stop().await {
                error!(installation_id = %handle.id, %error, "installation failed to stop");
            }
        }
        StopResult::Stopped
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkspaceClient for WorkspaceMax<C> {
    async fn list_installations(&self) -> Result<Vec<InstallationSummary>, MaxError> {
        Ok(self
            .registry
            .list()
            .into_iter()
            .map(|r| InstallationSummary {
                id: r.id,
                connector: r.connector,
                name: r.name,
                connected_at: r.connected_at,
            })
            .collect())
    }

    async fn create_installation(&self, config: InstallationConfig) -> Result<InstallationId, MaxError> {
        if self.is_duplicate(&config.connector, &config.name) {
            return Err(FederationError::DuplicateInstallation {
                connector: config.connector,
                name: config.name,
            }
            .into());
        }

        let connector = self.connector(&config.connector)?;
        let kind: DeployerKind = config.strategy.parse()?;
        let deployer = self.deployer(kind)?;

        let handle = deployer.create(config.config.clone(), InstallationSpec { connector }).await?;
        self.place(config, handle).await
    }

    async fn connect_installation(&self, config: InstallationConfig) -> Result<InstallationId, MaxError> {
        let connector = self.connector(&config.connector)?;
        let kind: DeployerKind = config.strategy.parse()?;
        let deployer = self.deployer(kind)?;

        let handle = deployer.connect(config.config.clone(), InstallationSpec { connector }).await?;
        let description = handle.client.describe().await?;
        info!(connector = %config.connector, %description, "connected installation");
        self.place(config, handle).await
    }

    async fn remove_installation(&self, id: &InstallationId) -> Result<(), MaxError> {
        self.installations.unregister(id);
        self.registry.remove(id)?;
        self.dispatchers.lock().remove(id.as_str());

        if let Some(locator) = self.locators.lock().remove(id) {
            if let Ok(deployer) = self.deployer(locator.deployer_kind) {
                let connector = self.connector(&locator.connector)?;
                deployer.teardown(locator.config, InstallationSpec { connector }).await?;
            }
        }
        Ok(())
    }

    async fn list_connectors(&self) -> Result<Vec<String>, MaxError> {
        Ok(self.connectors.keys().cloned().collect())
    }

    async fn connector_schema(&self, connector: &str) -> Result<Schema, MaxError> {
        Ok(self.connector(connector)?.schema().clone())
    }

    async fn connector_onboarding(&self, connector: &str) -> Result<Value, MaxError> {
        Ok(self.connector(connector)?.onboarding())
    }
}

impl<C: Clock + 'static> InstallationRouter for WorkspaceMax<C> {
    fn dispatcher_for(&self, installation_id: &str) -> Option<Arc<Dispatcher>> {
        if let Some(cached) = self.dispatchers.lock().get(installation_id) {
            return Some(cached.clone());
        }

        let id = InstallationId::from_string(installation_id.to_string());
        let handle = self.installations.get(&id)?;
        let dispatcher = Arc::new(
            Dispatcher::new()
                .with_target("", Arc::new(InstallationHandler::new(handle.client)))
                .with_target("engine", Arc::new(EngineHandler::new(handle.engine))),
        );
        self.dispatchers.lock().insert(installation_id.to_string(), dispatcher.clone());
        Some(dispatcher)
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
