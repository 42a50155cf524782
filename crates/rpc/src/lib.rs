// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! max-rpc: the scope-routed RPC plane (`spec.md` §4.2-§4.5) — wire DTOs
//! live in `max-wire`, this crate adds the interfaces that cross that
//! boundary plus the proxy/handler/dispatcher triad that implements them.

pub mod contracts;
pub mod dispatcher;
pub mod errors;
pub mod handler;
pub mod proxy;

pub use contracts::{
    ConnectorSummary, GlobalClient, InstallationClient, InstallationConfig, InstallationSummary,
    SyncCompletion, SyncStatus, WorkspaceClient, WorkspaceSummary,
};
pub use dispatcher::{Dispatcher, Handler, InstallationRouter};
pub use errors::RpcError;
pub use handler::{EngineHandler, GlobalHandler, InstallationHandler, SupervisedHandler, WorkspaceHandler};
pub use proxy::{EngineProxy, GlobalProxy, InstallationProxy, SupervisedProxy, WorkspaceProxy};
