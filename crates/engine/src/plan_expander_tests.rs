use max_core::{EntityId, EntityTypeId, FakeClock, Operation, Ref, Scope, Step, SyncPlan, Target, TaskPayload, TaskState};
use max_storage::TaskStore;

use super::*;

fn root_ref() -> Ref {
    Ref::new(EntityTypeId::from_string("typ-root"), EntityId::from_string("ent-root"), Scope::Installation)
}

#[test]
fn expand_inserts_a_group_and_one_step_task_per_plan_step() {
    let store = TaskStore::new(FakeClock::new());
    let sync_id = SyncId::new();
    let plan = SyncPlan::new()
        .with_step(Step::new(Target::for_root(root_ref()), Operation::load_collection("items")))
        .with_step(Step::new(Target::for_all(EntityTypeId::from_string("typ-item")), Operation::load_fields(["name"])));

    let group_id = expand(&store, sync_id, &plan);
    let group = store.get(&group_id).unwrap();
    assert!(matches!(group.payload, TaskPayload::SyncGroup(_)));
    assert_eq!(group.state, TaskState::Pending);

    let children = store.find_by_parent(&group_id);
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|t| matches!(t.payload, TaskPayload::SyncStep(_))));
}

#[test]
fn expand_wires_blocked_by_to_the_earlier_steps_task_id() {
    let store = TaskStore::new(FakeClock::new());
    let sync_id = SyncId::new();
    let plan = SyncPlan::new()
        .with_step(Step::new(Target::for_root(root_ref()), Operation::load_collection("items")))
        .with_step(
            Step::new(Target::for_all(EntityTypeId::from_string("typ-item")), Operation::load_fields(["name"]))
                .blocked_by([0]),
        );

    let group_id = expand(&store, sync_id, &plan);
    let children = store.find_by_parent(&group_id);
    let first = children.iter().find(|t| t.blocked_by.is_none()).unwrap();
    let second = children.iter().find(|t| t.blocked_by.is_some()).unwrap();
    assert_eq!(second.blocked_by, Some(first.id));
}
