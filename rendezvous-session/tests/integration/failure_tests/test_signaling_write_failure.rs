use std::sync::Arc;
use std::time::Duration;

use rendezvous_session::{
    CoordinatorConfig, MemoryStore, Phase, Role, SessionCoordinator, SessionId,
};

use crate::integration::{create_participant, init_tracing, wait_for_role};
use crate::utils::{
    FlakyStore, MockTransportFactory, PHASE_TIMEOUT_MS, QUIET_PERIOD_MS, wait_for_phase,
};

#[tokio::test]
async fn test_candidate_append_failure_keeps_call_up() {
    init_tracing();

    let store = MemoryStore::new();
    let a_store = FlakyStore::new(store.connect());
    let a_transport = MockTransportFactory::new("a");
    let a = SessionCoordinator::new(
        Arc::new(a_store.clone()),
        Arc::new(a_transport.clone()),
        CoordinatorConfig::default(),
    );
    let b = create_participant(&store, "b");

    a.start(SessionId::from("request-19")).await.unwrap();
    assert!(wait_for_role(&a, Role::Offerer).await);
    b.coordinator.start(SessionId::from("request-19")).await.unwrap();
    assert!(wait_for_phase(&a, Phase::Connected, PHASE_TIMEOUT_MS).await);
    assert!(wait_for_phase(&b.coordinator, Phase::Connected, PHASE_TIMEOUT_MS).await);

    a_store.set_fail_appends(true);
    a_transport.emit_local_candidate("a-lost").await;
    tokio::time::sleep(Duration::from_millis(QUIET_PERIOD_MS)).await;

    assert_eq!(a.phase(), Phase::Connected);
    assert!(b.transport.applied_candidates().await.is_empty());

    // The next candidate goes through once the store recovers
    a_store.set_fail_appends(false);
    a_transport.emit_local_candidate("a-1").await;
    tokio::time::sleep(Duration::from_millis(QUIET_PERIOD_MS)).await;
    assert_eq!(b.transport.applied_candidates().await, vec!["a-1".to_string()]);

    a.leave().await;
    b.coordinator.leave().await;
}

#[tokio::test]
async fn test_role_write_failure_keeps_negotiating() {
    init_tracing();

    let store = MemoryStore::new();
    let a_store = FlakyStore::new(store.connect());
    a_store.set_fail_writes(true);
    let a_transport = MockTransportFactory::new("a");
    let a = SessionCoordinator::new(
        Arc::new(a_store),
        Arc::new(a_transport.clone()),
        CoordinatorConfig::default(),
    );
    let paths = SessionId::from("request-20").paths();

    a.start(SessionId::from("request-20")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(QUIET_PERIOD_MS)).await;

    assert_eq!(a.phase(), Phase::Negotiating);
    assert_eq!(a.role(), Role::Undetermined);
    assert!(store.value_at(&paths.offerer()).is_none());
    assert!(store.value_at(&paths.offer()).is_none());
    assert!(a_transport.calls().await.is_empty());

    a.leave().await;
    assert_eq!(a.phase(), Phase::Closed);
}
