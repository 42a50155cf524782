use std::sync::Arc;

use async_trait::async_trait;
use max_core::{HealthStatus, StartResult, StopResult, Supervised};

use super::*;

#[derive(Clone)]
struct FakeNode {
    health: HealthStatus,
}

#[async_trait]
impl Supervised for FakeNode {
    async fn health(&self) -> HealthStatus {
        self.health.clone()
    }

    async fn start(&self) -> StartResult {
        StartResult::Started
    }

    async fn stop(&self) -> StopResult {
        StopResult::Stopped
    }
}

fn seq_supervisor() -> Supervisor<Arc<FakeNode>, String> {
    let counter = Arc::new(std::sync::atomic::AtomicU64::new(0));
    Supervisor::new(move || {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        format!("auto-{n}")
    })
}

#[test]
fn register_assigns_an_id_only_when_absent() {
    let supervisor = seq_supervisor();
    let auto_id = supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), None);
    assert_eq!(auto_id, "auto-0");

    let explicit_id =
        supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("chosen".to_string()));
    assert_eq!(explicit_id, "chosen");
}

#[test]
fn list_enumerates_in_registration_order() {
    let supervisor = seq_supervisor();
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("a".to_string()));
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("b".to_string()));
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("c".to_string()));

    let ids: Vec<String> = supervisor.list().into_iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn unregister_removes_and_get_stops_finding_it() {
    let supervisor = seq_supervisor();
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("a".to_string()));
    assert!(supervisor.get(&"a".to_string()).is_some());

    supervisor.unregister(&"a".to_string());
    assert!(supervisor.get(&"a".to_string()).is_none());
}

#[tokio::test]
async fn health_is_healthy_with_zero_children() {
    let supervisor: Supervisor<Arc<FakeNode>, String> = seq_supervisor();
    assert_eq!(supervisor.health().await, HealthStatus::Healthy);
}

#[tokio::test]
async fn health_is_healthy_when_every_child_is_healthy() {
    let supervisor = seq_supervisor();
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("a".to_string()));
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("b".to_string()));
    assert_eq!(supervisor.health().await, HealthStatus::Healthy);
}

#[tokio::test]
async fn health_is_unhealthy_when_every_child_is_unhealthy() {
    let supervisor = seq_supervisor();
    supervisor.register(
        Arc::new(FakeNode { health: HealthStatus::unhealthy("down") }),
        Some("a".to_string()),
    );
    supervisor.register(
        Arc::new(FakeNode { health: HealthStatus::unhealthy("down") }),
        Some("b".to_string()),
    );
    match supervisor.health().await {
        HealthStatus::Unhealthy { .. } => {}
        other => panic!("expected unhealthy, got {other:?}"),
    }
}

#[tokio::test]
async fn health_is_degraded_when_children_are_mixed() {
    let supervisor = seq_supervisor();
    supervisor.register(Arc::new(FakeNode { health: HealthStatus::Healthy }), Some("a".to_string()));
    supervisor.register(
        Arc::new(FakeNode { health: HealthStatus::unhealthy("down") }),
        Some("b".to_string()),
    );
    match supervisor.health().await {
        HealthStatus::Degraded { unhealthy_children, .. } => assert_eq!(unhealthy_children, Some(1)),
        other => panic!("expected degraded, got {other:?}"),
    }
}
