// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry of live child node handles (`spec.md` §4.6,
//! GLOSSARY: Supervisor). Grounded on the teacher's `RuntimeRouter`
//! registry shape (`crates/daemon/src/adapters/agent/router.rs`): an
//! `Arc<Mutex<HashMap<..,..>>>` keyed lookup the router consults before
//! delegating — generalized here from a fixed two-route dispatch to an
//! arbitrary id-keyed set of `Supervised` children, with `IndexMap`
//! swapped in for `HashMap` so `list()` can promise registration order.

use std::hash::Hash;

use indexmap::IndexMap;
use max_core::{HealthStatus, Supervised};
use parking_lot::Mutex;

/// A parent's view of one registered child (`spec.md` §4.7's `Handle`
/// generalized to whatever payload `R` the parent needs alongside the id).
#[derive(Debug, Clone)]
pub struct NodeHandle<R, Id> {
    pub id: Id,
    pub node: R,
}

/// In-memory map of `NodeHandle<R, Id>`, keyed by `Id`, in registration
/// order.
pub struct Supervisor<R, Id> {
    children: Mutex<IndexMap<Id, R>>,
    id_gen: Box<dyn Fn() -> Id + Send + Sync>,
}

impl<R, Id> Supervisor<R, Id>
where
    R: Clone + Send + Sync,
    Id: Clone + Eq + Hash + Send + Sync,
{
    /// `id_gen` backs `register` when the caller doesn't already have an
    /// id for the node (e.g. `InstallationId::new`/`WorkspaceId::new`).
    pub fn new(id_gen: impl Fn() -> Id + Send + Sync + 'static) -> Self {
        Self { children: Mutex::new(IndexMap::new()), id_gen: Box::new(id_gen) }
    }

    /// Register `node`, assigning an id via the injected generator when
    /// `id` is absent.
    pub fn register(&self, node: R, id: Option<Id>) -> Id {
        let id = id.unwrap_or_else(|| (self.id_gen)());
        self.children.lock().insert(id.clone(), node);
        id
    }

    pub fn unregister(&self, id: &Id) -> Option<R> {
        self.children.lock().shift_remove(id)
    }

    pub fn get(&self, id: &Id) -> Option<R> {
        self.children.lock().get(id).cloned()
    }

    /// Enumerate children in registration order.
    pub fn list(&self) -> Vec<NodeHandle<R, Id>> {
        self.children
            .lock()
            .iter()
            .map(|(id, node)| NodeHandle { id: id.clone(), node: node.clone() })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.lock().is_empty()
    }
}

impl<R, Id> Supervisor<R, Id>
where
    R: Supervised + Clone + Send + Sync + 'static,
    Id: Clone + Eq + Hash + Send + Sync,
{
    /// Aggregate child health (`spec.md` §4.6): healthy iff all children
    /// are healthy (or there are none); unhealthy iff all are unhealthy;
    /// else degraded. A child whose probe panics contributes
    /// `unhealthy("unreachable")` rather than propagating.
    pub async fn health(&self) -> HealthStatus {
        let children: Vec<R> = self.children.lock().values().cloned().collect();
        if children.is_empty() {
            return HealthStatus::Healthy;
        }

        let total = children.len();
        let handles: Vec<_> =
            children.into_iter().map(|child| tokio::spawn(async move { child.health().await })).collect();

        let mut unhealthy = 0usize;
        for handle in handles {
            let healthy = handle.await.map(|status| status.is_healthy()).unwrap_or(false);
            if !healthy {
                unhealthy += 1;
            }
        }

        if unhealthy == 0 {
            HealthStatus::Healthy
        } else if unhealthy == total {
            HealthStatus::unhealthy("unreachable")
        } else {
            HealthStatus::Degraded {
                reason: Some(format!("{unhealthy} of {total} children unhealthy")),
                unhealthy_children: Some(unhealthy),
            }
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
