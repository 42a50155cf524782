// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a `SyncPlan` into the root task tree a `SyncExecutor` drains
//! (`spec.md` §4.9).
//!
//! Every step becomes a `sync-step` task parented under one `sync-group`
//! task so they share a single aggregation point; a step's own
//! `blockedBy` indices become `blockedBy` task ids once earlier steps have
//! been inserted.

use max_core::{SyncId, SyncPlan, SyncStepPayload, TaskId, TaskPayload, TaskTemplate};
use max_storage::TaskStore;

/// Insert `plan` as a task tree rooted at a fresh `sync-group`. Returns the
/// group's id, which `SyncExecutor` tracks as the whole sync's root.
pub fn expand<C: max_core::Clock>(store: &TaskStore<C>, sync_id: SyncId, plan: &SyncPlan) -> TaskId {
    let group_id = store.insert(sync_id, TaskTemplate::new(TaskPayload::SyncGroup(Default::default())));

    let mut step_ids: Vec<TaskId> = Vec::with_capacity(plan.steps.len());
    for step in &plan.steps {
        let mut template = TaskTemplate::new(TaskPayload::SyncStep(SyncStepPayload {
            target: step.target.clone(),
            operation: step.operation.clone(),
        }))
        .child_of(group_id);
        if let Some(&blocker_index) = step.blocked_by.first() {
            if let Some(&blocker_id) = step_ids.get(blocker_index) {
                template = template.blocked_by(blocker_id);
            }
        }
        step_ids.push(store.insert(sync_id, template));
    }

    group_id
}

#[cfg(test)]
#[path = "plan_expander_tests.rs"]
mod tests;
