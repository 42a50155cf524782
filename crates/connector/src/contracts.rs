// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The connector contract (`spec.md` §4.8-§4.11, GLOSSARY): schema, seeder,
//! resolver, loaders and the opaque per-tenant `Installation` context a
//! connector hands its seeder and loaders.
//!
//! Grounded on the teacher's `AgentAdapter` trait-plus-test-fake shape
//! (`crates/adapters/src/agent/coop/adapter.rs`): one capability trait per
//! concern, `async_trait` object-safe, a `test-support` feature gating a
//! fake implementation other crates use in their own tests.

use std::sync::Arc;

use async_trait::async_trait;
use max_core::{Engine, EntityTypeId, LoaderBatch, LoaderName, MaxError, Page, PageRequest, Ref, Schema, SyncPlan};
use serde_json::Value;

/// The opaque per-tenant object a `Connector::connect` produces: resolved
/// credentials plus whatever context a `Seeder`/`Loader` needs to talk to
/// the third-party SaaS.
pub trait Installation: Send + Sync {
    /// The connector-specific config this installation was connected with.
    fn config(&self) -> &Value;
}

/// Produces the initial [`SyncPlan`] for a connector (`spec.md` §4.9).
#[async_trait]
pub trait Seeder: Send + Sync {
    async fn seed(&self, installation: &dyn Installation, engine: &dyn Engine) -> Result<SyncPlan, MaxError>;
}

/// Maps entity fields to the loader that fetches them (`spec.md` §4.9).
pub trait Resolver: Send + Sync {
    /// Partition `fields` of `entity_type` across the loaders that serve them.
    fn resolve_fields(&self, entity_type: &EntityTypeId, fields: &[String]) -> Vec<LoaderBatch>;

    /// The loader that serves `field` as a collection of `entity_type`.
    fn resolve_collection(&self, entity_type: &EntityTypeId, field: &str) -> Result<LoaderName, MaxError>;
}

/// A callable that fetches a batch of entities or a collection page
/// (`spec.md` §4.9, §4.11).
#[async_trait]
pub trait Loader: Send + Sync {
    /// Fetch `fields` for every ref in `refs`, returning one result per ref
    /// actually found upstream (a ref the SaaS no longer has may be
    /// dropped from the result, not erred).
    async fn load_fields(
        &self,
        installation: &dyn Installation,
        refs: &[Ref],
        fields: &[String],
    ) -> Result<Vec<max_core::EntityInput>, MaxError>;

    /// Fetch one page of `field` on `parent`.
    async fn load_collection(
        &self,
        installation: &dyn Installation,
        parent: &Ref,
        field: &str,
        page: PageRequest,
    ) -> Result<Page<Ref>, MaxError>;
}

/// A description of a connector's onboarding flow, opaque to this crate
/// (the flow interpreter is out of scope — `spec.md` Non-goals).
pub type OnboardingDescriptor = Value;

/// An opaque plugin describing how to sync a third-party SaaS (GLOSSARY:
/// Connector). Individual connector implementations are a Non-goal; this
/// trait is the seam a concrete connector crate implements.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The connector's identifying name, e.g. `"github"`.
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    fn resolver(&self) -> &dyn Resolver;

    fn seeder(&self) -> &dyn Seeder;

    /// Look up a named loader.
    fn loader(&self, name: &LoaderName) -> Result<Arc<dyn Loader>, MaxError>;

    /// The onboarding flow description this connector exposes, e.g. to
    /// render a credential-collection wizard.
    fn onboarding(&self) -> OnboardingDescriptor;

    /// Resolve credentials/config into a live per-tenant [`Installation`].
    async fn connect(
        &self,
        config: Value,
        credentials: Option<Value>,
    ) -> Result<Arc<dyn Installation>, MaxError>;
}

#[cfg(test)]
#[path = "contracts_tests.rs"]
mod tests;
