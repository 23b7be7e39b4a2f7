use rendezvous_session::{MemoryStore, Phase, Role, SessionId};

use crate::integration::{create_participant, init_tracing, wait_for_role};
use crate::utils::{PHASE_TIMEOUT_MS, wait_until};

#[tokio::test]
async fn test_drop_leaves_session() {
    init_tracing();

    let store = MemoryStore::new();
    let a = create_participant(&store, "a");
    let root = SessionId::from("request-15").paths().root().to_string();

    a.coordinator.start(SessionId::from("request-15")).await.unwrap();
    assert!(wait_for_role(&a.coordinator, Role::Offerer).await);
    assert!(store.contains_subtree(&root));

    let mut phase = a.coordinator.watch_phase();
    drop(a.coordinator);

    let reached = tokio::time::timeout(
        std::time::Duration::from_millis(PHASE_TIMEOUT_MS),
        phase.wait_for(|p| *p == Phase::Closed),
    )
    .await;
    assert!(matches!(reached, Ok(Ok(_))));

    let s = store.clone();
    assert!(
        wait_until(
            move || {
                let (s, root) = (s.clone(), root.clone());
                async move { !s.contains_subtree(&root) }
            },
            PHASE_TIMEOUT_MS,
        )
        .await
    );
    assert_eq!(store.pending_disconnect_actions(), 0);
}
