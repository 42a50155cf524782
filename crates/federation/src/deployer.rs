// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialises a node of a given technology (`spec.md` §4.7, GLOSSARY:
//! Deployer/Locator). Grounded on the teacher's `RuntimeRouter` (`crates/
//! daemon/src/adapters/agent/router.rs`): a `Route` enum picks which
//! concrete adapter owns an agent, one adapter struct per technology.
//! Generalized here into a `Deployer` trait so `WorkspaceMax`/`GlobalMax`
//! can hold a kind-keyed registry of them instead of a fixed two-way
//! match.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use max_core::MaxError;
use serde_json::{json, Value};

use crate::errors::FederationError;

/// Which technology a [`Deployer`] materialises a node through. The
/// discriminant a node's config names under its `strategy` field
/// (`spec.md` §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeployerKind {
    /// Test scaffold: wraps an already-built client, ignoring config.
    Inline,
    /// Same process, a direct object.
    InProcess,
    /// Child process reached over a socket transport.
    Subprocess,
    /// Named for completeness (`spec.md` §4.7); spawning/tearing down a
    /// container is daemon process supervision, out of scope here.
    Docker,
    /// Named for completeness; an HTTP transport deployer would need a
    /// network client this workspace's dependency stack doesn't carry.
    Remote,
}

impl DeployerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployerKind::Inline => "inline",
            DeployerKind::InProcess => "in-process",
            DeployerKind::Subprocess => "subprocess",
            DeployerKind::Docker => "docker",
            DeployerKind::Remote => "remote",
        }
    }
}

impl std::str::FromStr for DeployerKind {
    type Err = MaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inline" => Ok(DeployerKind::Inline),
            "in-process" => Ok(DeployerKind::InProcess),
            "subprocess" | "daemon" => Ok(DeployerKind::Subprocess),
            "docker" => Ok(DeployerKind::Docker),
            "remote" => Ok(DeployerKind::Remote),
            other => Err(FederationError::UnknownDeployerKind { kind: other.to_string() }.into()),
        }
    }
}

impl std::fmt::Display for DeployerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parent's opaque view of a freshly materialised child, before a
/// [`crate::supervisor::Supervisor`] has stamped an id on it (`spec.md`
/// §4.7).
pub struct UnlabelledHandle<Client> {
    pub deployer_kind: DeployerKind,
    pub client: Client,
    /// A serialisable address letting a deployer `connect()` back to this
    /// node later (GLOSSARY: Locator). Opaque outside the deployer that
    /// produced it.
    pub locator: Value,
}

/// Factory that materialises a node of technology `Self::kind()`.
/// `Config` is the deployer's own technology-specific config; `Spec` is
/// the node-specific descriptor (e.g. a connector plus its install
/// config) the deployer needs to build or reattach to a client.
#[async_trait]
pub trait Deployer<Client, Spec>: Send + Sync {
    fn kind(&self) -> DeployerKind;

    /// Build a fresh node.
    async fn create(&self, config: Value, spec: Spec) -> Result<UnlabelledHandle<Client>, MaxError>;

    /// Reattach to an already-running node. Some deployers may refuse
    /// this (e.g. `inline` has nothing persistent to reattach to).
    async fn connect(&self, config: Value, spec: Spec) -> Result<UnlabelledHandle<Client>, MaxError>;

    /// Release the deployment. Teardown of a deployment the deployer
    /// itself didn't create (e.g. `connect()`-ed) is a caller decision,
    /// not enforced here.
    async fn teardown(&self, config: Value, spec: Spec) -> Result<(), MaxError>;
}

type BuildFuture<Client> = Pin<Box<dyn Future<Output = Result<Client, MaxError>> + Send>>;

/// The `in-process` deployer: runs `build` to produce the client directly
/// in this process, no child process or socket involved. The actual
/// construction logic (e.g. assembling an `InstallationMax`) lives in the
/// closure a caller supplies — this struct only owns the `DeployerKind`
/// bookkeeping and locator shape common to every in-process node.
pub struct InProcessDeployer<Client, Spec> {
    build: Box<dyn Fn(Value, Spec) -> BuildFuture<Client> + Send + Sync>,
}

impl<Client, Spec> InProcessDeployer<Client, Spec> {
    pub fn new(build: impl Fn(Value, Spec) -> BuildFuture<Client> + Send + Sync + 'static) -> Self {
        Self { build: Box::new(build) }
    }
}

#[async_trait]
impl<Client, Spec> Deployer<Client, Spec> for InProcessDeployer<Client, Spec>
where
    Client: Send + Sync + 'static,
    Spec: Send + 'static,
{
    fn kind(&self) -> DeployerKind {
        DeployerKind::InProcess
    }

    async fn create(&self, config: Value, spec: Spec) -> Result<UnlabelledHandle<Client>, MaxError> {
        let client = (self.build)(config, spec).await?;
        Ok(UnlabelledHandle { deployer_kind: DeployerKind::InProcess, client, locator: json!({"kind": "in-process"}) })
    }

    /// A same-process node has no separate reattach step; `connect`
    /// simply rebuilds it.
    async fn connect(&self, config: Value, spec: Spec) -> Result<UnlabelledHandle<Client>, MaxError> {
        self.create(config, spec).await
    }

    async fn teardown(&self, _config: Value, _spec: Spec) -> Result<(), MaxError> {
        Ok(())
    }
}

/// The `inline` deployer: a test scaffold that hands back a client built
/// ahead of time, ignoring `config`/`spec` entirely.
pub struct InlineDeployer<Client> {
    client: Client,
}

impl<Client: Clone> InlineDeployer<Client> {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<Client, Spec> Deployer<Client, Spec> for InlineDeployer<Client>
where
    Client: Clone + Send + Sync,
    Spec: Send + 'static,
{
    fn kind(&self) -> DeployerKind {
        DeployerKind::Inline
    }

    async fn create(&self, _config: Value, _spec: Spec) -> Result<UnlabelledHandle<Client>, MaxError> {
        Ok(UnlabelledHandle {
            deployer_kind: DeployerKind::Inline,
            client: self.client.clone(),
            locator: json!({"kind": "inline"}),
        })
    }

    async fn connect(&self, config: Value, spec: Spec) -> Result<UnlabelledHandle<Client>, MaxError> {
        self.create(config, spec).await
    }

    async fn teardown(&self, _config: Value, _spec: Spec) -> Result<(), MaxError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "deployer_tests.rs"]
mod tests;
