use max_core::{EntityId, EntityTypeId, Scope};

use super::*;

fn person_ref(suffix: &str) -> Ref {
    Ref::new(EntityTypeId::from_string("typ-person"), EntityId::from_string(format!("ent-{suffix}")), Scope::Installation)
}

fn input(entity_ref: Ref, fields: &[(&str, Value)]) -> EntityInput {
    EntityInput { entity_ref, fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect() }
}

#[tokio::test]
async fn store_then_load_all_returns_stored_fields() {
    let engine = MemoryEngine::new();
    let entity_ref = person_ref("1");
    engine.store(input(entity_ref.clone(), &[("name", Value::String("Ada".into()))])).await.unwrap();

    let loaded = engine.load(&entity_ref, Projection::All).await.unwrap();
    assert_eq!(loaded.fields.get("name"), Some(&Value::String("Ada".into())));
}

#[tokio::test]
async fn store_is_idempotent() {
    let engine = MemoryEngine::new();
    let entity_ref = person_ref("1");
    let payload = input(entity_ref.clone(), &[("name", Value::String("Ada".into()))]);
    engine.store(payload.clone()).await.unwrap();
    engine.store(payload).await.unwrap();

    let loaded = engine.load(&entity_ref, Projection::All).await.unwrap();
    assert_eq!(loaded.fields.len(), 1);
}

#[tokio::test]
async fn load_unknown_ref_reports_not_found() {
    let engine = MemoryEngine::new();
    let err = engine.load(&person_ref("missing"), Projection::All).await.unwrap_err();
    assert_eq!(err.code, "core.entity_not_found");
}

#[tokio::test]
async fn select_projection_fails_on_field_never_stored() {
    let engine = MemoryEngine::new();
    let entity_ref = person_ref("1");
    engine.store(input(entity_ref.clone(), &[("name", Value::String("Ada".into()))])).await.unwrap();

    let err = engine.load(&entity_ref, Projection::select(["email"])).await.unwrap_err();
    assert_eq!(err.code, "core.field_not_loaded");
}

#[tokio::test]
async fn load_field_returns_the_value() {
    let engine = MemoryEngine::new();
    let entity_ref = person_ref("1");
    engine.store(input(entity_ref.clone(), &[("name", Value::String("Ada".into()))])).await.unwrap();

    assert_eq!(engine.load_field(&entity_ref, "name").await.unwrap(), Value::String("Ada".into()));
}

#[tokio::test]
async fn collection_sink_feeds_load_collection() {
    let engine = MemoryEngine::new();
    let parent = person_ref("root");
    let children = vec![person_ref("a"), person_ref("b")];
    engine.record_collection_page(&parent, "reports", children.clone(), true).await;

    let page = engine.load_collection(&parent, "reports", None).await.unwrap();
    assert_eq!(page.items, children);
    assert!(!page.has_more);
}

#[tokio::test]
async fn load_page_paginates_by_entity_type() {
    let engine = MemoryEngine::new();
    for i in 0..(PAGE_SIZE + 5) {
        engine.store(input(person_ref(&i.to_string()), &[])).await.unwrap();
    }
    let entity_type = EntityTypeId::from_string("typ-person");

    let first = engine.load_page(&entity_type, Projection::Refs, None).await.unwrap();
    assert_eq!(first.items.len(), PAGE_SIZE);
    assert!(first.has_more);

    let second = engine.load_page(&entity_type, Projection::Refs, first.cursor).await.unwrap();
    assert_eq!(second.items.len(), 5);
    assert!(!second.has_more);
}

#[tokio::test]
async fn query_filters_by_where_clause() {
    let engine = MemoryEngine::new();
    engine.store(input(person_ref("1"), &[("role", Value::String("admin".into()))])).await.unwrap();
    engine.store(input(person_ref("2"), &[("role", Value::String("member".into()))])).await.unwrap();
    let entity_type = EntityTypeId::from_string("typ-person");

    let query = Query {
        where_clause: Some(WhereClause::Leaf {
            field: "role".to_string(),
            op: WhereOp::Eq,
            value: Value::String("admin".into()),
        }),
        order_by: None,
        descending: false,
    };
    let page = engine.query(&entity_type, query, None).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].entity_ref, person_ref("1"));
}

#[tokio::test]
async fn query_orders_results() {
    let engine = MemoryEngine::new();
    engine.store(input(person_ref("1"), &[("age", Value::from(30))])).await.unwrap();
    engine.store(input(person_ref("2"), &[("age", Value::from(20))])).await.unwrap();
    let entity_type = EntityTypeId::from_string("typ-person");

    let query = Query { where_clause: None, order_by: Some("age".to_string()), descending: false };
    let page = engine.query(&entity_type, query, None).await.unwrap();
    assert_eq!(page.items[0].entity_ref, person_ref("2"));
    assert_eq!(page.items[1].entity_ref, person_ref("1"));
}
