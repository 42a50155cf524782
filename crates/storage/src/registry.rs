// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installation registry and workspace manifest: the federation's durable
//! membership lists (`spec.md` §3, §4.6).
//!
//! Grounded on the teacher's record-keyed-by-id shape
//! (`crates/storage/src/state/types.rs`'s `Workspace`/`Session`, inserted
//! and removed from a `HashMap` under a lock rather than replayed from a
//! WAL — see [`crate::task_store`] for why this crate drops the event-
//! sourcing layer).

use std::collections::HashMap;

use max_core::{DurationMs, InstallationId, MaxError, WorkspaceId};
use parking_lot::Mutex;

use crate::errors::StorageError;

/// One installation entry (`spec.md` §3: connector, name, connected_at).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstallationRecord {
    pub id: InstallationId,
    pub connector: String,
    pub name: String,
    pub connected_at: DurationMs,
}

/// Durable `installationId -> InstallationRecord` table a workspace owns.
#[derive(Default)]
pub struct InstallationRegistry {
    installations: Mutex<HashMap<InstallationId, InstallationRecord>>,
}

impl InstallationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: InstallationRecord) {
        self.installations.lock().insert(record.id, record);
    }

    pub fn get(&self, id: &InstallationId) -> Result<InstallationRecord, MaxError> {
        self.installations
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::InstallationNotFound { installation_id: id.to_string() }.into())
    }

    pub fn remove(&self, id: &InstallationId) -> Result<(), MaxError> {
        self.installations
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::InstallationNotFound { installation_id: id.to_string() }.into())
    }

    pub fn list(&self) -> Vec<InstallationRecord> {
        self.installations.lock().values().cloned().collect()
    }
}

/// One workspace entry (`spec.md` §3: name, project root, connected_at).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub project_root: String,
    pub connected_at: DurationMs,
}

/// Durable `workspaceId -> WorkspaceRecord` table the global node owns.
#[derive(Default)]
pub struct WorkspaceManifest {
    workspaces: Mutex<HashMap<WorkspaceId, WorkspaceRecord>>,
}

impl WorkspaceManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: WorkspaceRecord) {
        self.workspaces.lock().insert(record.id, record);
    }

    pub fn get(&self, id: &WorkspaceId) -> Result<WorkspaceRecord, MaxError> {
        self.workspaces
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::WorkspaceNotFound { workspace_id: id.to_string() }.into())
    }

    pub fn remove(&self, id: &WorkspaceId) -> Result<(), MaxError> {
        self.workspaces
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::WorkspaceNotFound { workspace_id: id.to_string() }.into())
    }

    pub fn list(&self) -> Vec<WorkspaceRecord> {
        self.workspaces.lock().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
