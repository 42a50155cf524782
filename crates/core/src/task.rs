// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent task record the sync executor drains (`spec.md` §3,
//! §4.10).

use crate::ids::{DurationMs, EntityTypeId, LoaderName, SyncId, TaskId};
use crate::plan::{Operation, Target};
use crate::refs::Ref;

/// `Task`'s state DAG.
///
/// `new → pending → running → {completed | failed | awaiting_children}`;
/// `awaiting_children → completed` once every child has settled;
/// `* → paused → pending`; `* → cancelled` (terminal, reachable from any
/// non-terminal state). All other transitions are illegal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    New,
    Pending,
    Running,
    AwaitingChildren,
    Completed,
    Failed,
    Paused,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Cancelled)
    }

    /// Whether `self -> next` is a legal transition per the state DAG.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;
        if next == Cancelled {
            return !self.is_terminal();
        }
        if next == Paused {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (New, Pending)
                | (Pending, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, AwaitingChildren)
                | (AwaitingChildren, Completed)
                | (AwaitingChildren, Failed)
                | (Paused, Pending)
        )
    }
}

crate::simple_display! {
    TaskState {
        New => "new",
        Pending => "pending",
        Running => "running",
        AwaitingChildren => "awaiting_children",
        Completed => "completed",
        Failed => "failed",
        Paused => "paused",
        Cancelled => "cancelled",
    }
}

/// One loader batch: a set of refs plus the fields to pull from them via a
/// single named loader.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoadFieldsPayload {
    pub refs: Vec<Ref>,
    pub loader: LoaderName,
    pub fields: Vec<String>,
    /// Pagination cursor for a `forAll` target's continuation batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One parent ref whose named collection field needs paging.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoadCollectionPayload {
    pub parent: Ref,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// A `SyncPlan` step, not yet resolved against the engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyncStepPayload {
    pub target: Target,
    pub operation: Operation,
}

/// An aggregation node with no work of its own; it exists purely so its
/// children can share a single `blockedBy` gate.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SyncGroupPayload {
    pub label: Option<String>,
}

/// What a task actually does when claimed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TaskPayload {
    LoadFields(LoadFieldsPayload),
    LoadCollection(LoadCollectionPayload),
    SyncStep(SyncStepPayload),
    SyncGroup(SyncGroupPayload),
}

impl TaskPayload {
    pub fn entity_type_hint(&self) -> Option<&EntityTypeId> {
        match self {
            TaskPayload::SyncStep(step) => match &step.target {
                Target::ForAll { entity_type } => Some(entity_type),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A fully materialised task row. Constructed by `TaskStore::insert` from
/// a [`TaskTemplate`]; the store stamps `id`, `sync_id`, and `created_at`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub sync_id: SyncId,
    pub state: TaskState,
    pub payload: TaskPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DurationMs>,
    pub created_at: DurationMs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DurationMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<crate::error::MaxError>,
}

impl Task {
    pub fn is_claimable(&self, now: DurationMs) -> bool {
        self.state == TaskState::Pending && self.not_before.map_or(true, |nb| nb <= now)
    }
}

/// Unstamped task creation request, handed to `TaskStore::insert`.
///
/// Carries `not_before` as the extension point for retry-with-backoff
/// (`spec.md` §9): a runner that wants to retry a failed loader call
/// constructs a fresh template with `not_before` set instead of resetting
/// the failed task in place.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTemplate {
    pub payload: TaskPayload,
    pub parent_id: Option<TaskId>,
    pub blocked_by: Option<TaskId>,
    pub not_before: Option<DurationMs>,
}

impl TaskTemplate {
    pub fn new(payload: TaskPayload) -> Self {
        Self { payload, parent_id: None, blocked_by: None, not_before: None }
    }

    pub fn child_of(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn blocked_by(mut self, task_id: TaskId) -> Self {
        self.blocked_by = Some(task_id);
        self
    }

    pub fn not_before(mut self, when: DurationMs) -> Self {
        self.not_before = Some(when);
        self
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
