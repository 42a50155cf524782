// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runner a `SyncExecutor` injects to actually dispatch a claimed task
//! (`spec.md` §4.11). Pure with respect to the task store: it returns
//! children for the executor to insert, it never writes tasks itself.

use std::sync::Arc;

use async_trait::async_trait;
use max_connector::{Connector, Installation};
use max_core::{
    Clock, DurationMs, Engine, MaxError, Projection, Ref, SyncMeta, Task, TaskPayload, TaskTemplate,
};

use crate::memory_engine::CollectionSink;

/// Refs grouped into an implementation-chosen batch size per `load-fields`
/// child task (`spec.md` §4.9: "refs within a loader batch are grouped up
/// to an implementation batch size").
const LOAD_FIELDS_BATCH_SIZE: usize = 25;

/// What running a task produced.
pub enum RunOutcome {
    /// The task's own work is done; no children.
    Complete,
    /// Work failed outright.
    Failed(MaxError),
    /// The task spawned children and should move to `awaiting_children`.
    /// Empty when the task has no new work (a `sync-group`'s children were
    /// already inserted by the plan expander, or a `forAll` target
    /// resolved to zero refs).
    AwaitingChildren(Vec<TaskTemplate>),
}

#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, task: &Task) -> RunOutcome;
}

/// The runner this crate ships: resolves `loaderName`s via the
/// connector's resolver, drives loads through the connector's loaders,
/// and writes results into the engine (`spec.md` §4.11).
pub struct DefaultTaskRunner<C: Clock> {
    connector: Arc<dyn Connector>,
    installation: Arc<dyn Installation>,
    engine: Arc<dyn Engine>,
    collections: Arc<dyn CollectionSink>,
    sync_meta: Arc<dyn SyncMeta>,
    clock: C,
}

impl<C: Clock> DefaultTaskRunner<C> {
    pub fn new(
        connector: Arc<dyn Connector>,
        installation: Arc<dyn Installation>,
        engine: Arc<dyn Engine>,
        collections: Arc<dyn CollectionSink>,
        sync_meta: Arc<dyn SyncMeta>,
        clock: C,
    ) -> Self {
        Self { connector, installation, engine, collections, sync_meta, clock }
    }

    async fn resolve_target(&self, target: &max_core::Target) -> Result<Vec<Ref>, MaxError> {
        match target {
            max_core::Target::ForRoot { target } | max_core::Target::ForOne { target } => Ok(vec![target.clone()]),
            max_core::Target::ForAll { entity_type } => {
                let mut refs = Vec::new();
                let mut page = None;
                loop {
                    let result = self.engine.load_page(entity_type, Projection::Refs, page).await?;
                    refs.extend(result.items.into_iter().map(|r| r.entity_ref));
                    if !result.has_more {
                        break;
                    }
                    page = result.cursor;
                }
                Ok(refs)
            }
        }
    }

    async fn run_sync_step(&self, step: &max_core::SyncStepPayload) -> RunOutcome {
        let refs = match self.resolve_target(&step.target).await {
            Ok(refs) => refs,
            Err(err) => return RunOutcome::Failed(err),
        };

        let children = match &step.operation {
            max_core::Operation::LoadFields { fields } => self.spawn_load_fields_children(&refs, fields),
            max_core::Operation::LoadCollection { field } => refs
                .into_iter()
                .map(|parent| {
                    TaskTemplate::new(TaskPayload::LoadCollection(max_core::LoadCollectionPayload {
                        parent,
                        field: field.clone(),
                        cursor: None,
                    }))
                })
                .collect(),
        };

        RunOutcome::AwaitingChildren(children)
    }

    fn spawn_load_fields_children(&self, refs: &[Ref], fields: &[String]) -> Vec<TaskTemplate> {
        let Some(entity_type) = refs.first().map(|r| r.entity_type.clone()) else {
            return Vec::new();
        };
        let resolver = self.connector.resolver();
        let mut templates = Vec::new();
        for batch in resolver.resolve_fields(&entity_type, fields) {
            for (chunk_index, chunk) in refs.chunks(LOAD_FIELDS_BATCH_SIZE).enumerate() {
                let cursor = if refs.len() > LOAD_FIELDS_BATCH_SIZE { Some(chunk_index.to_string()) } else { None };
                templates.push(TaskTemplate::new(TaskPayload::LoadFields(max_core::LoadFieldsPayload {
                    refs: chunk.to_vec(),
                    loader: batch.loader.clone(),
                    fields: batch.fields.clone(),
                    cursor,
                })));
            }
        }
        templates
    }

    async fn run_load_fields(&self, payload: &max_core::LoadFieldsPayload) -> RunOutcome {
        let loader = match self.connector.loader(&payload.loader) {
            Ok(loader) => loader,
            Err(err) => {
                return RunOutcome::Failed(err.annotate(
                    "execution.unresolved_loader_batch",
                    format!("no connector loader registered under {}", payload.loader),
                ))
            }
        };

        let inputs = match loader.load_fields(self.installation.as_ref(), &payload.refs, &payload.fields).await {
            Ok(inputs) => inputs,
            Err(err) => return RunOutcome::Failed(err),
        };

        let now = DurationMs(self.clock.epoch_ms());
        for input in inputs {
            let stored_fields: Vec<String> =
                payload.fields.iter().filter(|f| input.fields.contains_key(*f)).cloned().collect();
            let entity_ref = input.entity_ref.clone();
            if let Err(err) = self.engine.store(input).await {
                return RunOutcome::Failed(err);
            }
            self.sync_meta.record_field_sync(&entity_ref, &stored_fields, now).await;
        }

        RunOutcome::Complete
    }

    async fn run_load_collection(&self, payload: &max_core::LoadCollectionPayload) -> RunOutcome {
        let loader_name = match self.connector.resolver().resolve_collection(&payload.parent.entity_type, &payload.field) {
            Ok(name) => name,
            Err(err) => return RunOutcome::Failed(err),
        };
        let loader = match self.connector.loader(&loader_name) {
            Ok(loader) => loader,
            Err(err) => {
                return RunOutcome::Failed(err.annotate(
                    "execution.unresolved_loader_batch",
                    format!("no connector loader registered under {}", loader_name),
                ))
            }
        };

        let page = match loader
            .load_collection(self.installation.as_ref(), &payload.parent, &payload.field, payload.cursor.clone())
            .await
        {
            Ok(page) => page,
            Err(err) => return RunOutcome::Failed(err),
        };

        self.collections
            .record_collection_page(&payload.parent, &payload.field, page.items.clone(), payload.cursor.is_none())
            .await;

        if page.has_more {
            RunOutcome::AwaitingChildren(vec![TaskTemplate::new(TaskPayload::LoadCollection(
                max_core::LoadCollectionPayload { parent: payload.parent.clone(), field: payload.field.clone(), cursor: page.cursor },
            ))])
        } else {
            RunOutcome::Complete
        }
    }
}

#[async_trait]
impl<C: Clock> TaskRunner for DefaultTaskRunner<C> {
    async fn run(&self, task: &Task) -> RunOutcome {
        match &task.payload {
            TaskPayload::SyncGroup(_) => RunOutcome::AwaitingChildren(Vec::new()),
            TaskPayload::SyncStep(step) => self.run_sync_step(step).await,
            TaskPayload::LoadFields(payload) => self.run_load_fields(payload).await,
            TaskPayload::LoadCollection(payload) => self.run_load_collection(payload).await,
        }
    }
}

#[cfg(test)]
#[path = "task_runner_tests.rs"]
mod tests;
