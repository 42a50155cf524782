use max_core::{EntityId, EntityTypeId, Operation, Ref, Scope, Schema, Step, SyncPlan, Target};

use super::*;

fn sample_ref() -> Ref {
    Ref::new(EntityTypeId::from_string("typ-root"), EntityId::from_string("ent-root"), Scope::Installation)
}

fn sample_plan() -> SyncPlan {
    SyncPlan::new().with_step(Step::new(Target::for_root(sample_ref()), Operation::load_collection("items")))
}

#[tokio::test]
async fn fake_connector_seeds_the_configured_plan() {
    let connector = FakeConnector::new("acme", Schema::new("acme"), sample_plan());
    let installation = connector.connect(serde_json::json!({"apiKey": "x"}), None).await.unwrap();

    struct NoopEngine;
    #[async_trait::async_trait]
    impl max_core::Engine for NoopEngine {
        async fn load(&self, _: &Ref, _: max_core::Projection) -> Result<max_core::EntityResult, MaxError> {
            unimplemented!()
        }
        async fn load_field(&self, _: &Ref, _: &str) -> Result<serde_json::Value, MaxError> {
            unimplemented!()
        }
        async fn load_collection(
            &self,
            _: &Ref,
            _: &str,
            _: max_core::PageRequest,
        ) -> Result<max_core::Page<Ref>, MaxError> {
            unimplemented!()
        }
        async fn store(&self, _: max_core::EntityInput) -> Result<Ref, MaxError> {
            unimplemented!()
        }
        async fn load_page(
            &self,
            _: &EntityTypeId,
            _: max_core::Projection,
            _: max_core::PageRequest,
        ) -> Result<max_core::Page<max_core::EntityResult>, MaxError> {
            unimplemented!()
        }
        async fn query(
            &self,
            _: &EntityTypeId,
            _: max_core::Query,
            _: max_core::PageRequest,
        ) -> Result<max_core::Page<max_core::EntityResult>, MaxError> {
            unimplemented!()
        }
    }

    let plan = connector.seeder().seed(installation.as_ref(), &NoopEngine).await.unwrap();
    assert_eq!(plan.steps.len(), 1);
}

#[test]
fn fake_connector_reports_unknown_loader() {
    let connector = FakeConnector::new("acme", Schema::new("acme"), sample_plan());
    let err = connector.loader(&LoaderName::from_string("ldr-missing")).unwrap_err();
    assert_eq!(err.code, "connector.unknown_loader");
}

#[test]
fn fake_connector_finds_registered_loader() {
    let loader_name = LoaderName::from_string("ldr-items");
    let connector = FakeConnector::new("acme", Schema::new("acme"), sample_plan())
        .with_loader(loader_name.clone(), std::sync::Arc::new(FnLoader::empty()));

    assert!(connector.loader(&loader_name).is_ok());
}
