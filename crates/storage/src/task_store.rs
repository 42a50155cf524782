// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task store: `insert`/`claim`/`complete`/`fail` plus the lookups the
//! sync executor needs (`spec.md` §4.10).
//!
//! Grounded on the teacher's materialized-state shape (a `HashMap` of
//! records mutated in place under a lock, see `crates/storage/src/state/
//! jobs.rs`/`workers.rs`), generalized from event replay to direct
//! claim/complete/fail methods — spec.md §4.10 asks for a state machine a
//! caller drives directly, not a WAL a caller replays.

use indexmap::IndexMap;
use max_core::{Clock, DurationMs, MaxError, SyncId, Task, TaskId, TaskState, TaskTemplate};
use parking_lot::Mutex;

use crate::errors::StorageError;

/// In-memory task table keyed by [`TaskId`].
///
/// Claim selection and cascading completion/failure all happen under one
/// lock acquisition, so `claim` never hands the same task to two callers
/// and a completion cascade never races a sibling's own completion.
///
/// Backed by an [`IndexMap`] rather than a `HashMap`: a batch of sibling
/// tasks (e.g. a `sync-group` and every `sync-step` child
/// `plan_expander.rs` inserts for it) can share an identical `created_at`
/// under `FakeClock`, and `claim`'s oldest-first tie-break relies on
/// insertion order in that case, not hash-bucket order.
pub struct TaskStore<C: Clock> {
    clock: C,
    tasks: Mutex<IndexMap<TaskId, Task>>,
}

impl<C: Clock> TaskStore<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, tasks: Mutex::new(IndexMap::new()) }
    }

    /// Stamp `id`/`sync_id`/`created_at` onto a template and insert it as
    /// `New` → `Pending`.
    pub fn insert(&self, sync_id: SyncId, template: TaskTemplate) -> TaskId {
        let id = TaskId::new();
        let now = DurationMs(self.clock.epoch_ms());
        let task = Task {
            id,
            sync_id,
            state: TaskState::Pending,
            payload: template.payload,
            parent_id: template.parent_id,
            blocked_by: template.blocked_by,
            not_before: template.not_before,
            created_at: now,
            completed_at: None,
            error: None,
        };
        self.tasks.lock().insert(id, task);
        id
    }

    /// Claim the oldest claimable task for `sync_id`: `Pending`, no
    /// `blockedBy` still open, and `notBefore` has elapsed. Atomic with
    /// respect to other callers of `claim`.
    pub fn claim(&self, sync_id: &SyncId) -> Option<Task> {
        let now = DurationMs(self.clock.epoch_ms());
        let mut tasks = self.tasks.lock();

        let claimable_id = tasks
            .values()
            .filter(|t| &t.sync_id == sync_id)
            .filter(|t| t.is_claimable(now))
            .filter(|t| match &t.blocked_by {
                Some(blocker) => tasks.get(blocker).map(|b| b.state.is_terminal()).unwrap_or(true),
                None => true,
            })
            .min_by_key(|t| t.created_at.as_millis())
            .map(|t| t.id)?;

        let task = tasks.get_mut(&claimable_id)?;
        task.state = TaskState::Running;
        Some(task.clone())
    }

    pub fn get(&self, task_id: &TaskId) -> Result<Task, MaxError> {
        self.tasks
            .lock()
            .get(task_id)
            .cloned()
            .ok_or_else(|| StorageError::TaskNotFound { task_id: task_id.to_string() }.into())
    }

    /// Complete a running task. Cascades: if completing `task_id` leaves
    /// every sibling under its parent terminal and the parent is awaiting
    /// children, the parent completes too (recursively up the chain).
    pub fn complete(&self, task_id: &TaskId) -> Result<(), MaxError> {
        let now = DurationMs(self.clock.epoch_ms());
        let mut tasks = self.tasks.lock();
        self.transition_terminal(&mut tasks, task_id, TaskState::Completed, now, None)?;
        self.cascade_parent_completion(&mut tasks, task_id, now);
        Ok(())
    }

    /// Fail a running task with `error`. Propagates fail-fast up the parent
    /// chain: every non-terminal ancestor also fails, annotated with the
    /// original error as its cause.
    pub fn fail(&self, task_id: &TaskId, error: MaxError) -> Result<(), MaxError> {
        let now = DurationMs(self.clock.epoch_ms());
        let mut tasks = self.tasks.lock();
        self.transition_terminal(&mut tasks, task_id, TaskState::Failed, now, Some(error.clone()))?;
        self.propagate_failure(&mut tasks, task_id, now, error);
        Ok(())
    }

    /// Transition a running task to `awaiting_children` once its children
    /// have been inserted (`spec.md` §4.11 step 2). Idempotent: a task
    /// already `awaiting_children` is left alone.
    pub fn await_children(&self, task_id: &TaskId) -> Result<(), MaxError> {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::TaskNotFound { task_id: task_id.to_string() })?;
        if task.state == TaskState::AwaitingChildren {
            return Ok(());
        }
        if !task.state.can_transition_to(TaskState::AwaitingChildren) {
            return Err(StorageError::InvalidTransition {
                task_id: task_id.to_string(),
                from: task.state.to_string(),
                to: TaskState::AwaitingChildren.to_string(),
            }
            .into());
        }
        task.state = TaskState::AwaitingChildren;
        Ok(())
    }

    /// Cancel a non-terminal task (`spec.md` §4.11 point 5). A task already
    /// terminal is left alone rather than reported as an error, since
    /// cancelling a whole sync walks every task regardless of state.
    pub fn cancel(&self, task_id: &TaskId) -> Result<(), MaxError> {
        let now = DurationMs(self.clock.epoch_ms());
        let mut tasks = self.tasks.lock();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::TaskNotFound { task_id: task_id.to_string() })?;
        if task.state.is_terminal() {
            return Ok(());
        }
        task.state = TaskState::Cancelled;
        task.completed_at = Some(now);
        Ok(())
    }

    fn transition_terminal(
        &self,
        tasks: &mut IndexMap<TaskId, Task>,
        task_id: &TaskId,
        to: TaskState,
        now: DurationMs,
        error: Option<MaxError>,
    ) -> Result<(), MaxError> {
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StorageError::TaskNotFound { task_id: task_id.to_string() })?;
        if !task.state.can_transition_to(to) {
            return Err(StorageError::InvalidTransition {
                task_id: task_id.to_string(),
                from: task.state.to_string(),
                to: to.to_string(),
            }
            .into());
        }
        task.state = to;
        task.completed_at = Some(now);
        task.error = error;
        Ok(())
    }

    fn children_of<'a>(&self, tasks: &'a IndexMap<TaskId, Task>, parent_id: &TaskId) -> Vec<&'a Task> {
        tasks.values().filter(|t| t.parent_id.as_ref() == Some(parent_id)).collect()
    }

    fn cascade_parent_completion(
        &self,
        tasks: &mut IndexMap<TaskId, Task>,
        settled_id: &TaskId,
        now: DurationMs,
    ) {
        let Some(parent_id) = tasks.get(settled_id).and_then(|t| t.parent_id) else { return };
        let children_settled = self
            .children_of(tasks, &parent_id)
            .iter()
            .all(|c| c.state == TaskState::Completed);
        if !children_settled {
            return;
        }
        let Some(parent) = tasks.get(&parent_id) else { return };
        if parent.state != TaskState::AwaitingChildren && parent.state != TaskState::Running {
            return;
        }
        if !parent.state.can_transition_to(TaskState::Completed) {
            return;
        }
        if let Some(parent) = tasks.get_mut(&parent_id) {
            parent.state = TaskState::Completed;
            parent.completed_at = Some(now);
        }
        self.cascade_parent_completion(tasks, &parent_id, now);
    }

    fn propagate_failure(
        &self,
        tasks: &mut IndexMap<TaskId, Task>,
        failed_id: &TaskId,
        now: DurationMs,
        cause: MaxError,
    ) {
        let Some(parent_id) = tasks.get(failed_id).and_then(|t| t.parent_id) else { return };
        let Some(parent) = tasks.get(&parent_id) else { return };
        if parent.state.is_terminal() || !parent.state.can_transition_to(TaskState::Failed) {
            return;
        }
        let error = cause.clone().annotate("storage.child_task_failed", "a child task failed");
        if let Some(parent) = tasks.get_mut(&parent_id) {
            parent.state = TaskState::Failed;
            parent.completed_at = Some(now);
            parent.error = Some(error.clone());
        }
        self.propagate_failure(tasks, &parent_id, now, error);
    }

    pub fn find_by_parent(&self, parent_id: &TaskId) -> Vec<Task> {
        self.tasks.lock().values().filter(|t| t.parent_id.as_ref() == Some(parent_id)).cloned().collect()
    }

    pub fn find_by_sync(&self, sync_id: &SyncId) -> Vec<Task> {
        self.tasks.lock().values().filter(|t| &t.sync_id == sync_id).cloned().collect()
    }

    pub fn count(&self, sync_id: &SyncId, state: Option<TaskState>) -> u64 {
        self.tasks
            .lock()
            .values()
            .filter(|t| &t.sync_id == sync_id)
            .filter(|t| state.map_or(true, |s| t.state == s))
            .count() as u64
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;
