// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A fully in-memory [`Connector`] for tests (`test-support` feature),
//! grounded on the teacher's `FakeAgentAdapter` (`crates/adapters/src/
//! agent/coop/adapter.rs`): closures stand in for the real network calls,
//! letting `max-engine`/`max-federation` tests drive a sync end to end
//! without a real SaaS.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use max_core::{Engine, EntityInput, EntityTypeId, LoaderBatch, LoaderName, MaxError, Page, PageRequest, Ref, Schema, SyncPlan};
use serde_json::Value;

use crate::contracts::{Connector, Installation, Loader, OnboardingDescriptor, Resolver, Seeder};
use crate::errors::ConnectorError;

pub struct FakeInstallation {
    pub config: Value,
}

impl Installation for FakeInstallation {
    fn config(&self) -> &Value {
        &self.config
    }
}

/// A [`Seeder`] that returns a fixed plan regardless of installation/engine.
pub struct FixedSeeder {
    pub plan: SyncPlan,
}

#[async_trait]
impl Seeder for FixedSeeder {
    async fn seed(&self, _installation: &dyn Installation, _engine: &dyn Engine) -> Result<SyncPlan, MaxError> {
        Ok(self.plan.clone())
    }
}

/// A [`Resolver`] built from an explicit `(entityType, field) -> loader`
/// table plus a single loader name for every collection field.
#[derive(Default)]
pub struct TableResolver {
    pub field_loaders: BTreeMap<(String, String), LoaderName>,
    pub collection_loaders: BTreeMap<(String, String), LoaderName>,
}

impl Resolver for TableResolver {
    fn resolve_fields(&self, entity_type: &EntityTypeId, fields: &[String]) -> Vec<LoaderBatch> {
        let mut by_loader: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for field in fields {
            let key = (entity_type.to_string(), field.clone());
            let loader = self
                .field_loaders
                .get(&key)
                .cloned()
                .unwrap_or_else(|| LoaderName::from_string("ldr-default"));
            by_loader.entry(loader.to_string()).or_default().push(field.clone());
        }
        by_loader
            .into_iter()
            .map(|(loader, fields)| LoaderBatch { loader: LoaderName::from_string(loader), fields })
            .collect()
    }

    fn resolve_collection(&self, entity_type: &EntityTypeId, field: &str) -> Result<LoaderName, MaxError> {
        let key = (entity_type.to_string(), field.to_string());
        self.collection_loaders.get(&key).cloned().ok_or_else(|| {
            ConnectorError::UnknownCollectionField { connector: "fake".to_string(), field: field.to_string() }
                .into()
        })
    }
}

type FieldsFn = dyn Fn(&[Ref], &[String]) -> Result<Vec<EntityInput>, MaxError> + Send + Sync;
type CollectionFn = dyn Fn(&Ref, &str, PageRequest) -> Result<Page<Ref>, MaxError> + Send + Sync;

/// A [`Loader`] backed by plain closures instead of network calls.
pub struct FnLoader {
    pub fields: Box<FieldsFn>,
    pub collection: Box<CollectionFn>,
}

impl FnLoader {
    pub fn new(
        fields: impl Fn(&[Ref], &[String]) -> Result<Vec<EntityInput>, MaxError> + Send + Sync + 'static,
        collection: impl Fn(&Ref, &str, PageRequest) -> Result<Page<Ref>, MaxError> + Send + Sync + 'static,
    ) -> Self {
        Self { fields: Box::new(fields), collection: Box::new(collection) }
    }

    pub fn empty() -> Self {
        Self::new(|_, _| Ok(Vec::new()), |_, _, _| Ok(Page::last(Vec::new())))
    }
}

#[async_trait]
impl Loader for FnLoader {
    async fn load_fields(
        &self,
        _installation: &dyn Installation,
        refs: &[Ref],
        fields: &[String],
    ) -> Result<Vec<EntityInput>, MaxError> {
        (self.fields)(refs, fields)
    }

    async fn load_collection(
        &self,
        _installation: &dyn Installation,
        parent: &Ref,
        field: &str,
        page: PageRequest,
    ) -> Result<Page<Ref>, MaxError> {
        (self.collection)(parent, field, page)
    }
}

/// A [`Connector`] assembled entirely from in-memory fixtures.
pub struct FakeConnector {
    pub name: String,
    pub schema: Schema,
    pub seeder: FixedSeeder,
    pub resolver: TableResolver,
    pub loaders: HashMap<LoaderName, Arc<dyn Loader>>,
    pub onboarding: OnboardingDescriptor,
}

impl FakeConnector {
    pub fn new(name: impl Into<String>, schema: Schema, plan: SyncPlan) -> Self {
        Self {
            name: name.into(),
            schema,
            seeder: FixedSeeder { plan },
            resolver: TableResolver::default(),
            loaders: HashMap::new(),
            onboarding: Value::Null,
        }
    }

    pub fn with_loader(mut self, name: LoaderName, loader: Arc<dyn Loader>) -> Self {
        self.loaders.insert(name, loader);
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn resolver(&self) -> &dyn Resolver {
        &self.resolver
    }

    fn seeder(&self) -> &dyn Seeder {
        &self.seeder
    }

    fn loader(&self, name: &LoaderName) -> Result<Arc<dyn Loader>, MaxError> {
        self.loaders.get(name).cloned().ok_or_else(|| {
            ConnectorError::UnknownLoader { connector: self.name.clone(), loader: name.to_string() }.into()
        })
    }

    fn onboarding(&self) -> OnboardingDescriptor {
        self.onboarding.clone()
    }

    async fn connect(&self, config: Value, _credentials: Option<Value>) -> Result<Arc<dyn Installation>, MaxError> {
        Ok(Arc::new(FakeInstallation { config }))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
