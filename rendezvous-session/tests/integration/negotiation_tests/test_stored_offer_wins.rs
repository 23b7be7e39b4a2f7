use rendezvous_session::{MemoryStore, Phase, Role, SessionDescription, SessionId, SignalingStore};

use crate::integration::{create_participant, init_tracing};
use crate::utils::{EngineCall, PHASE_TIMEOUT_MS, wait_for_phase};

#[tokio::test]
async fn test_stored_offer_wins() {
    init_tracing();

    let store = MemoryStore::new();
    let paths = SessionId::from("request-22").paths();

    // An offer is already there but nobody holds the offerer claim
    let stored_offer = serde_json::to_string(&SessionDescription::offer("offer-from-x")).unwrap();
    store
        .connect()
        .write(&paths.offer(), stored_offer.clone())
        .await
        .unwrap();

    let a = create_participant(&store, "a");
    a.coordinator.start(SessionId::from("request-22")).await.unwrap();

    assert!(wait_for_phase(&a.coordinator, Phase::Connected, PHASE_TIMEOUT_MS).await);
    assert_eq!(a.coordinator.role(), Role::Answerer);

    assert_eq!(store.value_at(&paths.offer()), Some(stored_offer));
    let answer: SessionDescription =
        serde_json::from_str(&store.value_at(&paths.answer()).unwrap()).unwrap();
    assert_eq!(answer, SessionDescription::answer("answer-from-a"));

    assert_eq!(
        a.transport.calls().await,
        vec![
            EngineCall::CreateOffer,
            EngineCall::SetLocal(SessionDescription::offer("offer-from-a")),
            EngineCall::SetRemote(SessionDescription::offer("offer-from-x")),
            EngineCall::CreateAnswer,
            EngineCall::SetLocal(SessionDescription::answer("answer-from-a")),
        ]
    );

    a.coordinator.leave().await;
}
