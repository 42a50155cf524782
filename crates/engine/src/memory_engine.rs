// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The installation's data plane (`spec.md` §4.12): an in-memory
//! implementation of `max_core::Engine`, keyed by `RefKey` with a
//! secondary per-entity-type index for `loadPage`/`query`.
//!
//! Grounded on the teacher's `MaterializedState` shape (a `HashMap` of
//! records behind one lock, `crates/storage/src/state/mod.rs`) — generalized
//! from event-sourced mutation to direct upsert, same rationale as
//! `max-storage::task_store`.

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use max_core::{
    Engine, EntityInput, EntityResult, EntityTypeId, MaxError, Page, PageRequest, Projection, Query,
    Ref, RefKey, WhereBranchKind, WhereClause, WhereOp,
};
use parking_lot::Mutex;
use serde_json::Value;

use crate::errors::EngineError;

/// Fixed page size for the in-memory implementation's own pagination —
/// unrelated to any page size a connector's loader chooses.
const PAGE_SIZE: usize = 50;

/// Write path a `LoadCollection` task uses to record what a connector's
/// collection loader returned. Not part of the public `Engine` contract
/// (`spec.md` §4.12 fixes that to six read/write methods) — this is the
/// seam between `max-engine`'s task runner and its own in-memory store.
#[async_trait]
pub trait CollectionSink: Send + Sync {
    async fn record_collection_page(&self, parent: &Ref, field: &str, refs: Vec<Ref>, reset: bool);
}

#[derive(Default)]
struct Entities {
    by_ref: IndexMap<RefKey, EntityResult>,
    by_type: HashMap<EntityTypeId, Vec<RefKey>>,
    collections: HashMap<(RefKey, String), Vec<Ref>>,
}

/// An in-memory `Engine`. One instance per installation.
#[derive(Default)]
pub struct MemoryEngine {
    entities: Mutex<Entities>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn decode_cursor(page: &PageRequest) -> Result<usize, MaxError> {
        match page {
            None => Ok(0),
            Some(token) => {
                token.parse().map_err(|_| EngineError::InvalidCursor { cursor: token.clone() }.into())
            }
        }
    }

    fn paginate<T: Clone>(items: &[T], offset: usize) -> Page<T> {
        let end = (offset + PAGE_SIZE).min(items.len());
        let slice = items.get(offset..end).unwrap_or_default().to_vec();
        if end < items.len() {
            Page::more(slice, end.to_string())
        } else {
            Page::last(slice)
        }
    }
}

#[async_trait]
impl Engine for MemoryEngine {
    async fn load(&self, entity_ref: &Ref, projection: Projection) -> Result<EntityResult, MaxError> {
        let entities = self.entities.lock();
        let entry = entities
            .by_ref
            .get(&entity_ref.key())
            .ok_or_else(|| EngineError::EntityNotFound { entity_ref: entity_ref.to_string() })?;
        match &projection {
            Projection::All => Ok(entry.clone()),
            Projection::Refs => Ok(EntityResult { entity_ref: entry.entity_ref.clone(), fields: Default::default() }),
            Projection::Select { fields } => {
                let mut out = std::collections::BTreeMap::new();
                for field in fields {
                    let value = entry.fields.get(field).cloned().ok_or_else(|| EngineError::FieldNotLoaded {
                        entity_ref: entity_ref.to_string(),
                        field: field.clone(),
                    })?;
                    out.insert(field.clone(), value);
                }
                Ok(EntityResult { entity_ref: entry.entity_ref.clone(), fields: out })
            }
        }
    }

    async fn load_field(&self, entity_ref: &Ref, field: &str) -> Result<Value, MaxError> {
        let entities = self.entities.lock();
        let entry = entities
            .by_ref
            .get(&entity_ref.key())
            .ok_or_else(|| EngineError::EntityNotFound { entity_ref: entity_ref.to_string() })?;
        entry.fields.get(field).cloned().ok_or_else(|| EngineError::FieldNotLoaded {
            entity_ref: entity_ref.to_string(),
            field: field.to_string(),
        }.into())
    }

    async fn load_collection(
        &self,
        entity_ref: &Ref,
        field: &str,
        page: PageRequest,
    ) -> Result<Page<Ref>, MaxError> {
        let offset = Self::decode_cursor(&page)?;
        let entities = self.entities.lock();
        let refs = entities
            .collections
            .get(&(entity_ref.key(), field.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(Self::paginate(&refs, offset))
    }

    async fn store(&self, input: EntityInput) -> Result<Ref, MaxError> {
        let mut entities = self.entities.lock();
        let key = input.entity_ref.key();
        let entity_type = input.entity_ref.entity_type.clone();
        match entities.by_ref.get_mut(&key) {
            Some(existing) => existing.fields.extend(input.fields),
            None => {
                entities
                    .by_ref
                    .insert(key.clone(), EntityResult { entity_ref: input.entity_ref.clone(), fields: input.fields });
                entities.by_type.entry(entity_type).or_default().push(key);
            }
        }
        Ok(input.entity_ref)
    }

    async fn load_page(
        &self,
        entity_type: &EntityTypeId,
        projection: Projection,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        let offset = Self::decode_cursor(&page)?;
        let entities = self.entities.lock();
        let keys = entities.by_type.get(entity_type).cloned().unwrap_or_default();
        let results: Vec<EntityResult> = keys
            .iter()
            .filter_map(|key| entities.by_ref.get(key))
            .map(|entry| project(entry, &projection))
            .collect();
        Ok(Self::paginate(&results, offset))
    }

    async fn query(
        &self,
        entity_type: &EntityTypeId,
        query: Query,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError> {
        let offset = Self::decode_cursor(&page)?;
        let entities = self.entities.lock();
        let keys = entities.by_type.get(entity_type).cloned().unwrap_or_default();
        let mut results: Vec<EntityResult> = keys
            .iter()
            .filter_map(|key| entities.by_ref.get(key))
            .filter(|entry| query.where_clause.as_ref().map_or(true, |w| matches_clause(entry, w)))
            .cloned()
            .collect();
        if let Some(order_by) = &query.order_by {
            results.sort_by(|a, b| {
                let a_val = a.fields.get(order_by);
                let b_val = b.fields.get(order_by);
                compare_values(a_val, b_val)
            });
            if query.descending {
                results.reverse();
            }
        }
        Ok(Self::paginate(&results, offset))
    }
}

#[async_trait]
impl CollectionSink for MemoryEngine {
    async fn record_collection_page(&self, parent: &Ref, field: &str, refs: Vec<Ref>, reset: bool) {
        let mut entities = self.entities.lock();
        let key = (parent.key(), field.to_string());
        if reset {
            entities.collections.insert(key, refs);
        } else {
            entities.collections.entry(key).or_default().extend(refs);
        }
    }
}

fn project(entry: &EntityResult, projection: &Projection) -> EntityResult {
    match projection {
        Projection::All => entry.clone(),
        Projection::Refs => EntityResult { entity_ref: entry.entity_ref.clone(), fields: Default::default() },
        Projection::Select { fields } => EntityResult {
            entity_ref: entry.entity_ref.clone(),
            fields: entry
                .fields
                .iter()
                .filter(|(k, _)| fields.iter().any(|f| f == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        },
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.map(|v| v.to_string()).cmp(&b.map(|v| v.to_string())),
    }
}

fn matches_clause(entry: &EntityResult, clause: &WhereClause) -> bool {
    match clause {
        WhereClause::Leaf { field, op, value } => {
            let actual = entry.fields.get(field);
            match op {
                WhereOp::Eq => actual == Some(value),
                WhereOp::Ne => actual != Some(value),
                WhereOp::Gt => compare_opt(actual, value) == Some(std::cmp::Ordering::Greater),
                WhereOp::Gte => matches!(
                    compare_opt(actual, value),
                    Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)
                ),
                WhereOp::Lt => compare_opt(actual, value) == Some(std::cmp::Ordering::Less),
                WhereOp::Lte => matches!(
                    compare_opt(actual, value),
                    Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)
                ),
                WhereOp::Contains => match actual {
                    Some(Value::Array(items)) => items.contains(value),
                    Some(Value::String(s)) => value.as_str().map_or(false, |needle| s.contains(needle)),
                    _ => false,
                },
            }
        }
        WhereClause::Branch { kind, clauses } => match kind {
            WhereBranchKind::And => clauses.iter().all(|c| matches_clause(entry, c)),
            WhereBranchKind::Or => clauses.iter().any(|c| matches_clause(entry, c)),
        },
    }
}

fn compare_opt(actual: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
    let actual = actual?;
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => actual.as_str().zip(expected.as_str()).map(|(a, b)| a.cmp(b)),
    }
}

#[cfg(test)]
#[path = "memory_engine_tests.rs"]
mod tests;
