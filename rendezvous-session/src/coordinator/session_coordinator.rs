use crate::config::CoordinatorConfig;
use crate::coordinator::coordinator_command::CoordinatorCommand;
use crate::coordinator::lifecycle::SessionLifecycle;
use crate::coordinator::negotiation::{Negotiation, NegotiationChannels};
use crate::error::CallError;
use crate::store::SignalingStore;
use crate::transport::{RemoteStream, TransportFactory};
use rendezvous_core::{ParticipantId, Phase, Role, SessionId};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

enum Slot {
    Idle,
    Running {
        session_id: SessionId,
        command_tx: mpsc::Sender<CoordinatorCommand>,
        task: JoinHandle<()>,
    },
    Closed,
}

/// Drives one participant's side of a two-party call.
///
/// ```ignore
/// let transport = Arc::new(WebrtcTransportFactory::new());
/// let coordinator = SessionCoordinator::new(store, transport, config);
/// coordinator.start(SessionId::from("request-17")).await?;
/// let mut phase = coordinator.watch_phase();
/// // render `phase` changes...
/// coordinator.leave().await;
/// ```
pub struct SessionCoordinator {
    participant: ParticipantId,
    store: Arc<dyn SignalingStore>,
    transport: Arc<dyn TransportFactory>,
    config: CoordinatorConfig,
    phase_tx: Arc<watch::Sender<Phase>>,
    role_tx: Arc<watch::Sender<Role>>,
    remote_stream_tx: mpsc::UnboundedSender<RemoteStream>,
    remote_stream_rx: Mutex<Option<mpsc::UnboundedReceiver<RemoteStream>>>,
    slot: tokio::sync::Mutex<Slot>,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn SignalingStore>,
        transport: Arc<dyn TransportFactory>,
        config: CoordinatorConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(Phase::Idle);
        let (role_tx, _) = watch::channel(Role::Undetermined);
        let (remote_stream_tx, remote_stream_rx) = mpsc::unbounded_channel();

        Self {
            participant: ParticipantId::new(),
            store,
            transport,
            config,
            phase_tx: Arc::new(phase_tx),
            role_tx: Arc::new(role_tx),
            remote_stream_tx,
            remote_stream_rx: Mutex::new(Some(remote_stream_rx)),
            slot: tokio::sync::Mutex::new(Slot::Idle),
        }
    }

    pub fn participant_id(&self) -> ParticipantId {
        self.participant
    }

    pub fn phase(&self) -> Phase {
        *self.phase_tx.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    pub fn role(&self) -> Role {
        *self.role_tx.borrow()
    }

    /// Remote media handles forwarded from the transport. Handed out once.
    pub fn take_remote_streams(&self) -> Option<mpsc::UnboundedReceiver<RemoteStream>> {
        self.remote_stream_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Opens the transport and starts negotiating `session_id` in the
    /// background. Only transport initialization can fail here.
    pub async fn start(&self, session_id: SessionId) -> Result<(), CallError> {
        let mut slot = self.slot.lock().await;
        if !matches!(*slot, Slot::Idle) {
            return Err(CallError::AlreadyStarted);
        }

        let (transport_tx, transport_rx) = mpsc::channel(self.config.event_buffer);
        let engine = self
            .transport
            .create(&self.config.transport, transport_tx)
            .await
            .map_err(CallError::TransportUnavailable)?;

        info!("[{}] Joining session {}", self.participant, session_id);
        self.phase_tx.send_replace(Phase::Negotiating);

        let paths = session_id.paths();
        let (store_tx, store_rx) = mpsc::unbounded_channel();
        let mut lifecycle = SessionLifecycle::new(self.store.clone(), &paths);
        lifecycle.arm_disconnect_cleanup().await;
        lifecycle.subscribe(&paths.candidates(), store_tx.clone()).await;

        let (command_tx, command_rx) = mpsc::channel(self.config.event_buffer);
        let negotiation = Negotiation::new(
            self.participant,
            session_id.clone(),
            self.store.clone(),
            engine,
            self.config.clone(),
            lifecycle,
            NegotiationChannels {
                command_rx,
                store_tx,
                store_rx,
                transport_rx,
                phase_tx: self.phase_tx.clone(),
                role_tx: self.role_tx.clone(),
                remote_stream_tx: self.remote_stream_tx.clone(),
            },
        );
        let task = tokio::spawn(negotiation.run());

        *slot = Slot::Running {
            session_id,
            command_tx,
            task,
        };
        Ok(())
    }

    /// Ends the call and removes the session from the store. Repeated calls
    /// are no-ops.
    pub async fn leave(&self) {
        let mut slot = self.slot.lock().await;

        match std::mem::replace(&mut *slot, Slot::Closed) {
            Slot::Idle => {
                debug!("[{}] Leave before start", self.participant);
            }
            Slot::Running {
                session_id,
                command_tx,
                task,
            } => {
                info!("[{}] Leaving session {}", self.participant, session_id);

                let (done_tx, done_rx) = oneshot::channel();
                if command_tx
                    .send(CoordinatorCommand::Leave { done: done_tx })
                    .await
                    .is_ok()
                {
                    let _ = done_rx.await;
                } else {
                    debug!(
                        "[{}] Session {} was already torn down",
                        self.participant, session_id
                    );
                }

                if let Err(e) = task.await {
                    error!(
                        "[{}] Negotiation task for {} failed: {}",
                        self.participant, session_id, e
                    );
                }
            }
            Slot::Closed => return,
        }

        self.phase_tx.send_replace(Phase::Closed);
    }
}
