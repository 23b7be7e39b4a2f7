use rendezvous_session::{MemoryStore, Phase, Role, SessionId};

use crate::integration::{create_participant, init_tracing, wait_for_role};
use crate::utils::{EngineCall, wait_for_phase};

#[tokio::test]
async fn test_leave_before_answer() {
    init_tracing();

    let store = MemoryStore::new();
    let a = create_participant(&store, "a");
    let paths = SessionId::from("request-8").paths();

    a.coordinator.start(SessionId::from("request-8")).await.unwrap();
    assert!(wait_for_role(&a.coordinator, Role::Offerer).await);
    a.transport.emit_local_candidate("a-1").await;

    a.coordinator.leave().await;

    assert_eq!(a.coordinator.phase(), Phase::Closed);
    assert!(!store.contains_subtree(paths.root()));
    assert_eq!(store.deleted_subtrees(), 1);
    assert_eq!(store.subscriber_count(), 0);
    assert_eq!(store.pending_disconnect_actions(), 0);
    assert_eq!(a.transport.calls().await.last(), Some(&EngineCall::Close));

    // The session id is free again: the next participant starts over as offerer
    let c = create_participant(&store, "c");
    c.coordinator.start(SessionId::from("request-8")).await.unwrap();
    assert!(wait_for_role(&c.coordinator, Role::Offerer).await);
    assert_eq!(c.coordinator.phase(), Phase::Negotiating);
    assert!(!wait_for_phase(&c.coordinator, Phase::Connected, 100).await);

    c.coordinator.leave().await;
}

#[tokio::test]
async fn test_leave_before_start() {
    init_tracing();

    let store = MemoryStore::new();
    let a = create_participant(&store, "a");

    a.coordinator.leave().await;

    assert_eq!(a.coordinator.phase(), Phase::Closed);
    assert!(a.transport.calls().await.is_empty());
    assert_eq!(store.deleted_subtrees(), 0);
}
