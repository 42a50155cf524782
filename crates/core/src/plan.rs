// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A `Seeder`'s declarative output: a dependency-ordered list of load
//! steps (`spec.md` §4.9).

use crate::ids::{EntityTypeId, LoaderName};
use crate::refs::Ref;

/// What a [`Step`] resolves against the engine before running.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// A single, already-known ref (a seeder's entry point).
    ForRoot { target: Ref },
    /// A single, already-known ref (same resolution as `ForRoot`, distinct
    /// intent: "this one instance", not "the root of the sync").
    ForOne { target: Ref },
    /// Every instance of `entity_type` currently known to the engine,
    /// paged via `Projection::Refs`.
    ForAll { entity_type: EntityTypeId },
}

impl Target {
    pub fn for_root(target: Ref) -> Self {
        Target::ForRoot { target }
    }

    pub fn for_one(target: Ref) -> Self {
        Target::ForOne { target }
    }

    pub fn for_all(entity_type: impl Into<EntityTypeId>) -> Self {
        Target::ForAll { entity_type: entity_type.into() }
    }
}

/// What to do with each ref a [`Target`] resolves to.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Fetch the named fields, partitioned across whichever loaders the
    /// resolver says provide them.
    LoadFields { fields: Vec<String> },
    /// Page through a single collection field.
    LoadCollection { field: String },
}

impl Operation {
    pub fn load_fields(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Operation::LoadFields { fields: fields.into_iter().map(Into::into).collect() }
    }

    pub fn load_collection(field: impl Into<String>) -> Self {
        Operation::LoadCollection { field: field.into() }
    }
}

/// One step in a [`SyncPlan`]: resolve `target`, then apply `operation` to
/// every ref it resolves to.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    pub target: Target,
    pub operation: Operation,
    /// Steps that must settle before this one may be claimed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<usize>,
}

impl Step {
    pub fn new(target: Target, operation: Operation) -> Self {
        Self { target, operation, blocked_by: Vec::new() }
    }

    pub fn blocked_by(mut self, step_indices: impl IntoIterator<Item = usize>) -> Self {
        self.blocked_by = step_indices.into_iter().collect();
        self
    }
}

/// A seeder's declarative output: an ordered, dependency-annotated list of
/// [`Step`]s, handed to a `SyncExecutor`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SyncPlan {
    pub steps: Vec<Step>,
}

impl SyncPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }
}

/// Resolves a `loaderName` to a field grouping (`spec.md` §4.9): which
/// fields of a `load-fields` step are actually served by which loader.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoaderBatch {
    pub loader: LoaderName,
    pub fields: Vec<String>,
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
