// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `storage.*` error code namespace (`spec.md` §4.10).

max_core::define_errors! {
    pub enum StorageError as "storage" {
        TaskNotFound { task_id: String } => "task_not_found",
            "task {task_id} not found", [NotFound, HasEntityRef];
        InvalidTransition { task_id: String, from: String, to: String } => "invalid_transition",
            "task {task_id} cannot transition from {from} to {to}", [InvariantViolated];
        InstallationNotFound { installation_id: String } => "installation_not_found",
            "installation {installation_id} not registered", [NotFound];
        WorkspaceNotFound { workspace_id: String } => "workspace_not_found",
            "workspace {workspace_id} not registered", [NotFound];
    }
}
