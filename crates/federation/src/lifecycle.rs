// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composes a fixed dependency list of `Supervised` nodes into one
//! `Supervised` front (`spec.md` §4.6): entries run sequentially; a
//! nested group runs its members concurrently. `start` walks the list
//! forward and is idempotent as a whole (a second `start` after success
//! reports `already_running` without re-running any entry); `stop` walks
//! it in reverse and always runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use max_core::{HealthStatus, MaxError, StartResult, StopResult, Supervised};

/// One entry in an [`AutoLifecycle`]'s dependency list.
pub enum LifecycleEntry {
    /// A single dependency.
    Node(Arc<dyn Supervised>),
    /// A group of dependencies with no ordering between them.
    Concurrent(Vec<Arc<dyn Supervised>>),
}

impl LifecycleEntry {
    pub fn node(node: Arc<dyn Supervised>) -> Self {
        LifecycleEntry::Node(node)
    }

    async fn start(&self) -> StartResult {
        match self {
            LifecycleEntry::Node(node) => node.start().await,
            LifecycleEntry::Concurrent(nodes) => join_start(nodes).await,
        }
    }

    async fn stop(&self) -> StopResult {
        match self {
            LifecycleEntry::Node(node) => node.stop().await,
            LifecycleEntry::Concurrent(nodes) => join_stop(nodes).await,
        }
    }

    async fn health(&self) -> HealthStatus {
        match self {
            LifecycleEntry::Node(node) => node.health().await,
            LifecycleEntry::Concurrent(nodes) => {
                let mut unhealthy = 0usize;
                for node in nodes {
                    if !node.health().await.is_healthy() {
                        unhealthy += 1;
                    }
                }
                if unhealthy == 0 {
                    HealthStatus::Healthy
                } else if unhealthy == nodes.len() {
                    HealthStatus::unhealthy("all concurrent dependencies unhealthy")
                } else {
                    HealthStatus::Degraded {
                        reason: Some("some concurrent dependencies unhealthy".to_string()),
                        unhealthy_children: Some(unhealthy),
                    }
                }
            }
        }
    }
}

async fn join_start(nodes: &[Arc<dyn Supervised>]) -> StartResult {
    let handles: Vec<_> = nodes
        .iter()
        .map(|node| {
            let node = node.clone();
            tokio::spawn(async move { node.start().await })
        })
        .collect();
    let mut refused: Option<String> = None;
    for handle in handles {
        match handle.await {
            Ok(StartResult::Started) | Ok(StartResult::AlreadyRunning) => {}
            Ok(StartResult::Refused { reason }) => refused.get_or_insert(reason),
            Ok(StartResult::Error { error }) => return StartResult::Error { error },
            Err(join_err) => {
                return StartResult::Error {
                    error: MaxError::new("federation.lifecycle_task_panicked", join_err.to_string()),
                }
            }
        };
    }
    match refused {
        Some(reason) => StartResult::Refused { reason },
        None => StartResult::Started,
    }
}

async fn join_stop(nodes: &[Arc<dyn Supervised>]) -> StopResult {
    let handles: Vec<_> = nodes
        .iter()
        .map(|node| {
            let node = node.clone();
            tokio::spawn(async move { node.stop().await })
        })
        .collect();
    let mut last_error = None;
    for handle in handles {
        match handle.await {
            Ok(StopResult::Stopped) | Ok(StopResult::AlreadyStopped) => {}
            Ok(StopResult::Refused { reason }) => last_error = Some(StopResult::Refused { reason }),
            Ok(StopResult::Error { error }) => last_error = Some(StopResult::Error { error }),
            Err(join_err) => {
                last_error = Some(StopResult::Error {
                    error: MaxError::new("federation.lifecycle_task_panicked", join_err.to_string()),
                })
            }
        }
    }
    last_error.unwrap_or(StopResult::Stopped)
}

/// A node's own `Supervised` implementation delegating `start`/`stop` to a
/// fixed, ordered list of dependencies (`spec.md` §4.8: "Lifecycle
/// auto-composes `[installation, engine, executor]`").
pub struct AutoLifecycle {
    entries: Vec<LifecycleEntry>,
    started: AtomicBool,
}

impl AutoLifecycle {
    pub fn new(entries: Vec<LifecycleEntry>) -> Self {
        Self { entries, started: AtomicBool::new(false) }
    }
}

#[async_trait]
impl Supervised for AutoLifecycle {
    async fn health(&self) -> HealthStatus {
        let mut unhealthy = 0usize;
        for entry in &self.entries {
            if !entry.health().await.is_healthy() {
                unhealthy += 1;
            }
        }
        if unhealthy == 0 {
            HealthStatus::Healthy
        } else if unhealthy == self.entries.len() {
            HealthStatus::unhealthy("all dependencies unhealthy")
        } else {
            HealthStatus::Degraded {
                reason: Some("some dependencies unhealthy".to_string()),
                unhealthy_children: Some(unhealthy),
            }
        }
    }

    async fn start(&self) -> StartResult {
        if self.started.swap(true, Ordering::SeqCst) {
            return StartResult::AlreadyRunning;
        }
        for entry in &self.entries {
            match entry.start().await {
                StartResult::Started | StartResult::AlreadyRunning => {}
                other => return other,
            }
        }
        StartResult::Started
    }

    async fn stop(&self) -> StopResult {
        for entry in self.entries.iter().rev() {
            match entry.stop().await {
                StopResult::Stopped | StopResult::AlreadyStopped => {}
                other => return other,
            }
        }
        StopResult::Stopped
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
