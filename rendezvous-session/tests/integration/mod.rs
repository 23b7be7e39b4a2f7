pub mod lifecycle_tests;
pub mod negotiation_tests;

use std::sync::Arc;
use tracing::Level;

use rendezvous_session::{
    CoordinatorConfig, MemoryClient, MemoryStore, Phase, Role, SessionCoordinator, SessionId,
};

use crate::utils::{MockTransportFactory, PHASE_TIMEOUT_MS, wait_for_phase, wait_until};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A coordinator plus the handles a test needs to poke at it.
pub struct Participant {
    pub coordinator: SessionCoordinator,
    pub transport: MockTransportFactory,
    pub client: MemoryClient,
}

pub fn create_participant(store: &MemoryStore, label: &str) -> Participant {
    create_participant_with_config(store, label, CoordinatorConfig::default())
}

pub fn create_participant_with_config(
    store: &MemoryStore,
    label: &str,
    config: CoordinatorConfig,
) -> Participant {
    let client = store.connect();
    let transport = MockTransportFactory::new(label);
    let coordinator = SessionCoordinator::new(
        Arc::new(client.clone()),
        Arc::new(transport.clone()),
        config,
    );

    Participant {
        coordinator,
        transport,
        client,
    }
}

/// Wait until `coordinator` has settled on a role.
pub async fn wait_for_role(coordinator: &SessionCoordinator, role: Role) -> bool {
    wait_until(
        move || async move { coordinator.role() == role },
        PHASE_TIMEOUT_MS,
    )
    .await
}

/// Start `offerer` first, then `answerer`, and wait for both to connect.
pub async fn connect_pair(offerer: &Participant, answerer: &Participant, session: &str) {
    offerer
        .coordinator
        .start(SessionId::from(session))
        .await
        .expect("offerer failed to start");
    assert!(
        wait_for_role(&offerer.coordinator, Role::Offerer).await,
        "first participant should claim the offerer role"
    );

    answerer
        .coordinator
        .start(SessionId::from(session))
        .await
        .expect("answerer failed to start");

    assert!(wait_for_phase(&offerer.coordinator, Phase::Connected, PHASE_TIMEOUT_MS).await);
    assert!(wait_for_phase(&answerer.coordinator, Phase::Connected, PHASE_TIMEOUT_MS).await);
}
