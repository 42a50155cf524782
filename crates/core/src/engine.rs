// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine façade contract (`spec.md` §4.12): an installation's data
//! plane. Lives in `max-core` (not `max-engine`) so both `max-rpc`'s
//! proxy/handler pair and `max-engine`'s concrete implementation depend
//! on the same trait without a cycle between those two crates.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::MaxError;
use crate::ids::{DurationMs, EntityTypeId};
use crate::refs::Ref;

/// Which fields a read asks for.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    All,
    /// Only the ref itself, no fields — used by `forAll` step resolution.
    Refs,
    Select { fields: Vec<String> },
}

impl Projection {
    pub fn select(fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Projection::Select { fields: fields.into_iter().map(Into::into).collect() }
    }

    pub fn includes(&self, field: &str) -> bool {
        match self {
            Projection::All => true,
            Projection::Refs => false,
            Projection::Select { fields } => fields.iter().any(|f| f == field),
        }
    }
}

/// A read result: the ref plus whichever fields the projection selected.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityResult {
    pub entity_ref: Ref,
    pub fields: std::collections::BTreeMap<String, Value>,
}

/// An upsert input: a ref (or enough to derive one) plus the fields to
/// write. `store` is idempotent given the same `(ref, fields)`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EntityInput {
    pub entity_ref: Ref,
    pub fields: std::collections::BTreeMap<String, Value>,
}

/// A page of results with an opaque continuation cursor.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self { items, has_more: false, cursor: None }
    }

    pub fn more(items: Vec<T>, cursor: impl Into<String>) -> Self {
        Self { items, has_more: true, cursor: Some(cursor.into()) }
    }
}

/// Request token for a page: `None` starts from the beginning.
pub type PageRequest = Option<String>;

/// A leaf or branch condition in a [`Query`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum WhereClause {
    Leaf { field: String, op: WhereOp, value: Value },
    Branch { kind: WhereBranchKind, clauses: Vec<WhereClause> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhereOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WhereBranchKind {
    And,
    Or,
}

/// A filtered/ordered/paged read against one entity type.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Query {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

/// The installation's data plane (`spec.md` §4.12).
///
/// Invariants enforced by implementations: `store` is idempotent given the
/// same `(ref, fields)`; a field read that was never stored returns the
/// field's zero value only if the projection includes it, otherwise the
/// engine loads it transparently or fails with `core.field_not_loaded`;
/// query results are stable under the given ordering and cursors
/// round-trip.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn load(&self, entity_ref: &Ref, projection: Projection) -> Result<EntityResult, MaxError>;
    async fn load_field(&self, entity_ref: &Ref, field: &str) -> Result<Value, MaxError>;
    async fn load_collection(
        &self,
        entity_ref: &Ref,
        field: &str,
        page: PageRequest,
    ) -> Result<Page<Ref>, MaxError>;
    async fn store(&self, input: EntityInput) -> Result<Ref, MaxError>;
    async fn load_page(
        &self,
        entity_type: &EntityTypeId,
        projection: Projection,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError>;
    async fn query(
        &self,
        entity_type: &EntityTypeId,
        query: Query,
        page: PageRequest,
    ) -> Result<Page<EntityResult>, MaxError>;
}

/// Per-field sync metadata, keyed by `(refKey, field)` → timestamp.
/// Separate from entity data; joinable for freshness queries (`spec.md`
/// §3).
#[async_trait]
pub trait SyncMeta: Send + Sync {
    async fn record_field_sync(&self, entity_ref: &Ref, fields: &[String], now: DurationMs);
    async fn field_synced_at(&self, entity_ref: &Ref, field: &str) -> Option<DurationMs>;

    /// Fields whose last sync is older than `max_age`, or that were never
    /// synced at all. Used by `Resolver`s that want to skip fresh fields.
    async fn stale_fields(
        &self,
        entity_ref: &Ref,
        fields: &[String],
        now: DurationMs,
        max_age: DurationMs,
    ) -> Vec<String>;
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
