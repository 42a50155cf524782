// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The drain loop that turns a `SyncPlan` into settled tasks (`spec.md`
//! §4.11): expand the plan into a task tree, then repeatedly claim,
//! dispatch via a [`TaskRunner`], and insert whatever children it returns,
//! until nothing is left to claim.

use std::sync::Arc;
use std::time::Instant;

use max_core::{Clock, DurationMs, SyncId, SyncPlan, TaskState};
use max_storage::TaskStore;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::plan_expander;
use crate::task_runner::{RunOutcome, TaskRunner};

/// Outcome of a settled sync, mirroring `spec.md` §4.11 point 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Snapshot `completion()` returns once the sync has settled.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyncCompletion {
    pub status: SyncStatus,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub duration: DurationMs,
}

struct SharedState {
    status: SyncStatus,
    paused: bool,
}

/// Caller-side handle to a running sync (`spec.md` §4.11, GLOSSARY:
/// SyncHandle). Cloning shares the same underlying sync; the drain loop
/// itself runs on a spawned task and outlives any single clone.
#[derive(Clone)]
pub struct SyncHandle {
    id: SyncId,
    plan: SyncPlan,
    started_at: Instant,
    shared: Arc<Mutex<SharedState>>,
    settled: Arc<Notify>,
}

impl SyncHandle {
    pub fn id(&self) -> &SyncId {
        &self.id
    }

    pub fn plan(&self) -> &SyncPlan {
        &self.plan
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.lock().status
    }

    /// Inhibit further claims. The drain loop checks this before every
    /// claim attempt; in-flight tasks still settle normally.
    pub fn pause(&self) {
        self.shared.lock().paused = true;
    }

    pub fn resume(&self) {
        self.shared.lock().paused = false;
    }

    fn is_paused(&self) -> bool {
        self.shared.lock().paused
    }

    /// Mark every non-terminal task in this sync `cancelled` (`spec.md`
    /// §4.11 point 5). The drain loop observes the status change and
    /// stops claiming further tasks.
    pub fn cancel<C: Clock>(&self, store: &TaskStore<C>) {
        self.shared.lock().status = SyncStatus::Cancelled;
        for task in store.find_by_sync(&self.id) {
            if !task.state.is_terminal() {
                if let Err(err) = store.cancel(&task.id) {
                    tracing::error!(task_id = %task.id, error = %err, "failed to cancel task");
                }
            }
        }
        self.settled.notify_waiters();
    }

    /// Wait for the sync to settle and report final counts (`spec.md`
    /// §4.11 point 4).
    pub async fn completion<C: Clock>(&self, store: &TaskStore<C>) -> SyncCompletion {
        loop {
            {
                let shared = self.shared.lock();
                if shared.status != SyncStatus::Running {
                    break;
                }
            }
            self.settled.notified().await;
        }
        self.snapshot(store)
    }

    fn snapshot<C: Clock>(&self, store: &TaskStore<C>) -> SyncCompletion {
        let status = self.shared.lock().status;
        SyncCompletion {
            status,
            tasks_completed: store.count(&self.id, Some(TaskState::Completed)),
            tasks_failed: store.count(&self.id, Some(TaskState::Failed)),
            duration: DurationMs(self.started_at.elapsed().as_millis() as u64),
        }
    }
}

/// Drives a `SyncPlan` to completion against a [`TaskStore`] using an
/// injected [`TaskRunner`] (`spec.md` §4.11).
pub struct SyncExecutor<C: Clock> {
    store: Arc<TaskStore<C>>,
    runner: Arc<dyn TaskRunner>,
    clock: C,
}

impl<C: Clock + 'static> SyncExecutor<C> {
    pub fn new(store: Arc<TaskStore<C>>, runner: Arc<dyn TaskRunner>, clock: C) -> Self {
        Self { store, runner, clock }
    }

    /// Expand `plan` into root tasks and spawn the drain loop. Returns
    /// immediately with a [`SyncHandle`]; the loop runs on a background
    /// task until nothing claimable remains.
    pub fn execute(&self, sync_id: SyncId, plan: SyncPlan) -> SyncHandle {
        let group_id = plan_expander::expand(&self.store, sync_id, &plan);

        let handle = SyncHandle {
            id: sync_id,
            plan,
            started_at: Instant::now(),
            shared: Arc::new(Mutex::new(SharedState { status: SyncStatus::Running, paused: false })),
            settled: Arc::new(Notify::new()),
        };

        let store = self.store.clone();
        let runner = self.runner.clone();
        let drain_handle = handle.clone();
        tokio::spawn(async move {
            drain(store, runner, drain_handle, group_id).await;
        });

        handle
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

async fn drain<C: Clock>(
    store: Arc<TaskStore<C>>,
    runner: Arc<dyn TaskRunner>,
    handle: SyncHandle,
    group_id: max_core::TaskId,
) {
    loop {
        if handle.status() == SyncStatus::Cancelled {
            break;
        }

        if handle.is_paused() {
            tokio::task::yield_now().await;
            continue;
        }

        let Some(task) = store.claim(&handle.id) else {
            let children = store.find_by_parent(&group_id);
            let group_done = store.get(&group_id).map(|t| t.state.is_terminal()).unwrap_or(true);
            let siblings_done = children.iter().all(|t| t.state.is_terminal());
            if group_done || siblings_done {
                break;
            }
            tokio::task::yield_now().await;
            continue;
        };

        let start = Instant::now();
        let outcome = runner.run(&task).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match outcome {
            RunOutcome::Complete => {
                if let Err(err) = store.complete(&task.id) {
                    tracing::error!(task_id = %task.id, error = %err, "failed to mark task completed");
                }
                tracing::info!(task_id = %task.id, elapsed_ms, "task completed");
            }
            RunOutcome::Failed(err) => {
                tracing::error!(task_id = %task.id, error = %err, elapsed_ms, "task failed");
                if let Err(store_err) = store.fail(&task.id, err) {
                    tracing::error!(task_id = %task.id, error = %store_err, "failed to mark task failed");
                }
            }
            RunOutcome::AwaitingChildren(templates) => {
                for template in templates {
                    store.insert(handle.id, template.child_of(task.id));
                }
                if let Err(err) = store.await_children(&task.id) {
                    tracing::error!(task_id = %task.id, error = %err, "failed to mark task awaiting_children");
                }
                tracing::info!(task_id = %task.id, elapsed_ms, "task awaiting children");
            }
        }

        handle.settled.notify_waiters();
    }

    if handle.status() != SyncStatus::Cancelled {
        let final_status = if store.count(&handle.id, Some(TaskState::Failed)) > 0 {
            SyncStatus::Failed
        } else {
            SyncStatus::Completed
        };
        handle.shared.lock().status = final_status;
    }
    handle.settled.notify_waiters();
}

#[cfg(test)]
#[path = "sync_executor_tests.rs"]
mod tests;
