use crate::config::CoordinatorConfig;
use crate::coordinator::candidate_buffer::{CandidateBuffer, CandidateOutcome};
use crate::coordinator::coordinator_command::CoordinatorCommand;
use crate::coordinator::lifecycle::{SessionLifecycle, TeardownReason};
use crate::error::CallError;
use crate::store::{Claim, ItemId, SignalingStore, StoreEvent};
use crate::transport::{RemoteStream, TransportEngine, TransportEvent};
use rendezvous_core::{
    CandidateEnvelope, IceCandidate, ParticipantId, Phase, Role, SessionDescription, SessionId,
    SessionPaths,
};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info, warn};

/// Channels connecting a negotiation task to the outside world.
pub(crate) struct NegotiationChannels {
    pub(crate) command_rx: mpsc::Receiver<CoordinatorCommand>,
    pub(crate) store_tx: mpsc::UnboundedSender<StoreEvent>,
    pub(crate) store_rx: mpsc::UnboundedReceiver<StoreEvent>,
    pub(crate) transport_rx: mpsc::Receiver<TransportEvent>,
    pub(crate) phase_tx: Arc<watch::Sender<Phase>>,
    pub(crate) role_tx: Arc<watch::Sender<Role>>,
    pub(crate) remote_stream_tx: mpsc::UnboundedSender<RemoteStream>,
}

/// One participant's side of a call. Owns the engine, the candidate buffer
/// and the phase; every input is handled sequentially by [`Negotiation::run`].
pub(crate) struct Negotiation {
    participant: ParticipantId,
    session_id: SessionId,
    paths: SessionPaths,
    store: Arc<dyn SignalingStore>,
    engine: Box<dyn TransportEngine>,
    config: CoordinatorConfig,
    lifecycle: SessionLifecycle,
    buffer: CandidateBuffer,
    seen_candidates: HashSet<ItemId>,
    role: Role,
    phase: Phase,
    remote_description_set: bool,
    channels: NegotiationChannels,
}

impl Negotiation {
    pub(crate) fn new(
        participant: ParticipantId,
        session_id: SessionId,
        store: Arc<dyn SignalingStore>,
        engine: Box<dyn TransportEngine>,
        config: CoordinatorConfig,
        lifecycle: SessionLifecycle,
        channels: NegotiationChannels,
    ) -> Self {
        let phase = *channels.phase_tx.borrow();
        Self {
            participant,
            paths: session_id.paths(),
            session_id,
            store,
            engine,
            config,
            lifecycle,
            buffer: CandidateBuffer::new(),
            seen_candidates: HashSet::new(),
            role: Role::Undetermined,
            phase,
            remote_description_set: false,
            channels,
        }
    }

    pub(crate) async fn run(mut self) {
        info!(
            "[{}] Negotiation for session {} started",
            self.participant, self.session_id
        );

        let deadline = self
            .config
            .negotiation_timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let expiry = sleep_until(deadline.unwrap_or_else(Instant::now));
        tokio::pin!(expiry);

        self.elect_role().await;

        loop {
            tokio::select! {
                biased;

                cmd = self.channels.command_rx.recv() => {
                    match cmd {
                        Some(CoordinatorCommand::Leave { done }) => {
                            self.teardown(TeardownReason::Leave).await;
                            let _ = done.send(());
                        }
                        None => {
                            info!("[{}] Coordinator dropped. Leaving session.", self.participant);
                            self.teardown(TeardownReason::Leave).await;
                        }
                    }
                    break;
                }

                Some(event) = self.channels.store_rx.recv() => {
                    if self.handle_store_event(event).await.is_break() {
                        break;
                    }
                }

                Some(event) = self.channels.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                }

                () = &mut expiry, if deadline.is_some() && self.phase == Phase::Negotiating => {
                    warn!(
                        "[{}] Negotiation for session {} timed out",
                        self.participant, self.session_id
                    );
                    self.set_phase(Phase::Failed);
                }
            }
        }

        info!(
            "[{}] Negotiation for session {} finished",
            self.participant, self.session_id
        );
    }

    async fn elect_role(&mut self) {
        let path = self.paths.offerer();
        match self
            .store
            .write_if_absent(&path, self.participant.to_string())
            .await
        {
            Ok(Claim::Claimed) => {
                info!("[{}] Claimed the offerer role", self.participant);
                self.set_role(Role::Offerer);
                self.send_offer().await;
            }
            Ok(Claim::Taken(holder)) => {
                info!("[{}] {} is the offerer, answering", self.participant, holder);
                self.set_role(Role::Answerer);
                let offer_path = self.paths.offer();
                self.lifecycle
                    .subscribe(&offer_path, self.channels.store_tx.clone())
                    .await;
            }
            Err(e) => warn!("[{}] {}", self.participant, CallError::write_failed(path, e)),
        }
    }

    async fn send_offer(&mut self) {
        let offer = match self.engine.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                error!("[{}] Failed to create offer: {:#}", self.participant, e);
                return;
            }
        };
        if let Err(e) = self.engine.set_local_description(offer.clone()).await {
            error!("[{}] Failed to set local offer: {:#}", self.participant, e);
            return;
        }

        let published = self.publish_description(self.paths.offer(), &offer).await;
        if let Some(Claim::Taken(_)) = published {
            // Somebody else's offer is authoritative; answer it instead.
            self.set_role(Role::Answerer);
            let offer_path = self.paths.offer();
            self.lifecycle
                .subscribe(&offer_path, self.channels.store_tx.clone())
                .await;
            return;
        }

        let answer_path = self.paths.answer();
        self.lifecycle
            .subscribe(&answer_path, self.channels.store_tx.clone())
            .await;
    }

    async fn handle_store_event(&mut self, event: StoreEvent) -> ControlFlow<()> {
        match event {
            StoreEvent::Value { path, value } if path == self.paths.offer() => {
                self.on_offer(value).await
            }
            StoreEvent::Value { path, value } if path == self.paths.answer() => {
                self.on_answer(value).await
            }
            StoreEvent::ChildAdded { path, key, value } if path == self.paths.candidates() => {
                self.on_candidate_entry(key, value).await
            }
            StoreEvent::Removed { path } if is_within(&path, self.paths.root()) => {
                info!(
                    "[{}] {} was removed, session {} is gone",
                    self.participant, path, self.session_id
                );
                self.teardown(TeardownReason::SessionRemoved).await;
                return ControlFlow::Break(());
            }
            StoreEvent::ConnectionLost => {
                warn!("[{}] Lost connection to the signaling store", self.participant);
                self.teardown(TeardownReason::ConnectionLost).await;
                return ControlFlow::Break(());
            }
            other => debug!("[{}] Ignoring store event {:?}", self.participant, other),
        }
        ControlFlow::Continue(())
    }

    async fn on_offer(&mut self, value: String) {
        if self.role != Role::Answerer || self.remote_description_set {
            debug!("[{}] Ignoring redundant offer", self.participant);
            return;
        }
        if self.phase != Phase::Negotiating {
            debug!("[{}] Offer arrived in phase {}", self.participant, self.phase);
            return;
        }
        let Some(offer) = self.decode_description(&value) else {
            return;
        };
        if !self.apply_remote_description(offer).await {
            return;
        }

        let answer = match self.engine.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                error!("[{}] Failed to create answer: {:#}", self.participant, e);
                return;
            }
        };
        if let Err(e) = self.engine.set_local_description(answer.clone()).await {
            error!("[{}] Failed to set local answer: {:#}", self.participant, e);
            return;
        }

        let published = self.publish_description(self.paths.answer(), &answer).await;
        if let Some(Claim::Claimed) = published {
            self.set_phase(Phase::Connected);
        }
    }

    async fn on_answer(&mut self, value: String) {
        if self.role != Role::Offerer || self.remote_description_set {
            debug!("[{}] Ignoring redundant answer", self.participant);
            return;
        }
        if self.phase != Phase::Negotiating {
            debug!("[{}] Answer arrived in phase {}", self.participant, self.phase);
            return;
        }
        let Some(answer) = self.decode_description(&value) else {
            return;
        };
        if self.apply_remote_description(answer).await {
            self.set_phase(Phase::Connected);
        }
    }

    /// Sets the remote description and releases the buffered candidates.
    async fn apply_remote_description(&mut self, description: SessionDescription) -> bool {
        if let Err(e) = self.engine.set_remote_description(description).await {
            warn!(
                "[{}] Failed to set remote description: {:#}",
                self.participant, e
            );
            return false;
        }
        self.remote_description_set = true;

        let flushed = self.buffer.flush(self.engine.as_ref()).await;
        debug!(
            "[{}] Remote description set, {} buffered candidates flushed",
            self.participant, flushed
        );
        true
    }

    async fn on_candidate_entry(&mut self, key: ItemId, value: String) {
        if !self.seen_candidates.insert(key.clone()) {
            debug!("[{}] Candidate {} already seen", self.participant, key);
            return;
        }
        let envelope: CandidateEnvelope = match serde_json::from_str(&value) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("[{}] Malformed candidate entry {}: {}", self.participant, key, e);
                return;
            }
        };
        if self.config.filter_own_candidates && envelope.from == self.participant {
            return;
        }

        let outcome = self
            .buffer
            .on_remote_candidate(envelope.candidate, self.engine.as_ref())
            .await;
        if outcome == CandidateOutcome::Queued {
            debug!(
                "[{}] Remote description not set yet, {} candidates waiting",
                self.participant,
                self.buffer.pending()
            );
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::LocalCandidate(candidate) => {
                self.forward_local_candidate(candidate).await;
            }
            TransportEvent::RemoteStreamAvailable(stream) => {
                info!(
                    "[{}] Remote {:?} track {} available",
                    self.participant, stream.kind, stream.track_id
                );
                let _ = self.channels.remote_stream_tx.send(stream);
            }
            TransportEvent::LinkStateChanged(state) => {
                debug!("[{}] Transport link is {:?}", self.participant, state);
            }
        }
    }

    async fn forward_local_candidate(&mut self, candidate: IceCandidate) {
        if self.lifecycle.is_torn_down() {
            debug!("[{}] Dropping local candidate after teardown", self.participant);
            return;
        }
        let path = self.paths.candidates();
        let envelope = CandidateEnvelope {
            from: self.participant,
            candidate,
        };
        let encoded = match serde_json::to_string(&envelope) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("[{}] Failed to encode candidate: {}", self.participant, e);
                return;
            }
        };
        if let Err(e) = self.store.append(&path, encoded).await {
            warn!("[{}] {}", self.participant, CallError::write_failed(path, e));
        }
    }

    /// Writes our offer or answer unless the slot is already taken. `None`
    /// when nothing could be written.
    async fn publish_description(
        &self,
        path: String,
        description: &SessionDescription,
    ) -> Option<Claim> {
        if self.lifecycle.is_torn_down() {
            return None;
        }
        let encoded = match serde_json::to_string(description) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("[{}] Failed to encode description: {}", self.participant, e);
                return None;
            }
        };
        match self.store.write_if_absent(&path, encoded).await {
            Ok(Claim::Claimed) => {
                info!("[{}] Published {:?} to {}", self.participant, description.kind, path);
                Some(Claim::Claimed)
            }
            Ok(Claim::Taken(existing)) => {
                warn!("[{}] {}", self.participant, CallError::DuplicateRoleWrite { path });
                Some(Claim::Taken(existing))
            }
            Err(e) => {
                warn!("[{}] {}", self.participant, CallError::write_failed(path, e));
                None
            }
        }
    }

    fn decode_description(&self, value: &str) -> Option<SessionDescription> {
        match serde_json::from_str(value) {
            Ok(description) => Some(description),
            Err(e) => {
                warn!("[{}] Malformed session description: {}", self.participant, e);
                None
            }
        }
    }

    async fn teardown(&mut self, reason: TeardownReason) {
        if self.lifecycle.is_torn_down() {
            return;
        }
        self.lifecycle.teardown(self.engine.as_ref(), reason).await;
        self.buffer.close();
        self.set_phase(Phase::Closed);
    }

    fn set_role(&mut self, role: Role) {
        self.role = role;
        self.channels.role_tx.send_replace(role);
    }

    fn set_phase(&mut self, next: Phase) {
        if !self.phase.can_become(next) {
            debug!(
                "[{}] Ignoring phase change {} -> {}",
                self.participant, self.phase, next
            );
            return;
        }
        info!("[{}] Phase {} -> {}", self.participant, self.phase, next);
        self.phase = next;
        self.channels.phase_tx.send_replace(next);
    }
}

fn is_within(path: &str, root: &str) -> bool {
    path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}
