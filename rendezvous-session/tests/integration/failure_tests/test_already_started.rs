use rendezvous_session::{CallError, MemoryStore, Phase, SessionId};

use crate::integration::{create_participant, init_tracing};

#[tokio::test]
async fn test_start_twice_is_rejected() {
    init_tracing();

    let store = MemoryStore::new();
    let a = create_participant(&store, "a");

    a.coordinator.start(SessionId::from("request-17")).await.unwrap();
    let second = a.coordinator.start(SessionId::from("request-18")).await;
    assert!(matches!(second, Err(CallError::AlreadyStarted)));
    assert!(!store.contains_subtree(SessionId::from("request-18").paths().root()));

    a.coordinator.leave().await;

    let after_leave = a.coordinator.start(SessionId::from("request-17")).await;
    assert!(matches!(after_leave, Err(CallError::AlreadyStarted)));
    assert_eq!(a.coordinator.phase(), Phase::Closed);
}
