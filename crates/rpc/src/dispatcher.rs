// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC dispatcher: routes `(target, method, args)` to a handler, with
//! scope-based delegation to a child installation dispatcher (`spec.md`
//! §4.5).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use max_core::MaxError;
use max_wire::{Dispatch, Request, Response};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::RpcError;

/// One target's method surface. Implementations match on `method` and
/// deserialize `args` themselves; unknown methods are the caller's
/// responsibility to surface as [`RpcError::UnknownMethod`].
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, MaxError>;
}

/// Looks up the dispatcher for a workspace-owned installation by id.
/// Implemented by `max-federation`'s `WorkspaceMax`, which caches
/// dispatchers per installation id (`spec.md` §4.5: "installation
/// dispatchers are cached per installation id at the workspace
/// dispatcher").
pub trait InstallationRouter: Send + Sync {
    fn dispatcher_for(&self, installation_id: &str) -> Option<Arc<Dispatcher>>;
}

/// Routes a [`Request`] to the handler registered for its target, or
/// delegates to a child installation dispatcher when `scope.installationId`
/// is present and this dispatcher owns a workspace.
pub struct Dispatcher {
    targets: HashMap<String, Arc<dyn Handler>>,
    installations: Option<Arc<dyn InstallationRouter>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { targets: HashMap::new(), installations: None }
    }

    pub fn with_target(mut self, target: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.targets.insert(target.into(), handler);
        self
    }

    pub fn with_installation_router(mut self, router: Arc<dyn InstallationRouter>) -> Self {
        self.installations = Some(router);
        self
    }

    /// Dispatch one request. Never throws — every error path returns an
    /// `{ok: false, error}` [`Response`].
    pub async fn dispatch(&self, request: Request) -> Response {
        if let Some(installation_id) =
            request.scope.as_ref().and_then(|s| s.installation_id.as_deref())
        {
            if let Some(router) = &self.installations {
                return match router.dispatcher_for(installation_id) {
                    Some(child) => {
                        let mut delegated = request.clone();
                        if let Some(scope) = delegated.scope.as_mut() {
                            scope.installation_id = None;
                        }
                        Box::pin(child.dispatch(delegated)).await
                    }
                    None => {
                        let err: MaxError = RpcError::NodeNotFound {
                            installation_id: installation_id.to_string(),
                        }
                        .into();
                        Response::err(request.id, err)
                    }
                };
            }
        }

        let Some(handler) = self.targets.get(&request.target) else {
            warn!(target = %request.target, "unknown RPC target");
            let err: MaxError = RpcError::UnknownTarget { target: request.target.clone() }.into();
            return Response::err(request.id, err);
        };

        info!(target = %request.target, method = %request.method, id = %request.id, "dispatching RPC request");
        match handler.call(&request.method, request.args).await {
            Ok(result) => Response::ok(request.id, result),
            Err(error) => Response::err(request.id, error),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn dispatch(&self, request: Request) -> Response {
        Dispatcher::dispatch(self, request).await
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
