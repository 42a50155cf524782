// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`max_core::SyncMeta`]: last-synced timestamps per
//! `(entity, field)`, used by resolvers to skip fields synced within a
//! freshness window (`spec.md` §4.5).
//!
//! Grounded on the same record-keyed-by-id shape as [`crate::task_store`]
//! and [`crate::registry`], keyed here by [`RefKey`] + field name instead
//! of an id newtype.

use std::collections::HashMap;

use async_trait::async_trait;
use max_core::{DurationMs, Ref, SyncMeta};
use parking_lot::Mutex;

#[derive(Default)]
pub struct MemorySyncMeta {
    synced_at: Mutex<HashMap<(String, String), DurationMs>>,
}

impl MemorySyncMeta {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(entity_ref: &Ref, field: &str) -> (String, String) {
        (entity_ref.key().to_string(), field.to_string())
    }
}

#[async_trait]
impl SyncMeta for MemorySyncMeta {
    async fn record_field_sync(&self, entity_ref: &Ref, fields: &[String], now: DurationMs) {
        let mut synced_at = self.synced_at.lock();
        for field in fields {
            synced_at.insert(Self::key(entity_ref, field), now);
        }
    }

    async fn field_synced_at(&self, entity_ref: &Ref, field: &str) -> Option<DurationMs> {
        self.synced_at.lock().get(&Self::key(entity_ref, field)).copied()
    }

    async fn stale_fields(
        &self,
        entity_ref: &Ref,
        fields: &[String],
        now: DurationMs,
        max_age: DurationMs,
    ) -> Vec<String> {
        let synced_at = self.synced_at.lock();
        fields
            .iter()
            .filter(|field| match synced_at.get(&Self::key(entity_ref, field)) {
                Some(last) => now.as_millis().saturating_sub(last.as_millis()) > max_age.as_millis(),
                None => true,
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "sync_meta_tests.rs"]
mod tests;
