use crate::store::{
    ChangeHandler, DisconnectAction, DisconnectActionId, SignalingStore, StoreEvent,
    SubscriptionId,
};
use crate::transport::TransportEngine;
use rendezvous_core::SessionPaths;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TeardownReason {
    /// Caller asked to leave; we own the store cleanup.
    Leave,
    /// The store dropped our connection and already ran the disconnect action.
    ConnectionLost,
    /// The other participant deleted the session; nothing left to delete.
    SessionRemoved,
}

/// Tracks everything a call acquires in the store so it can be released
/// exactly once.
///
/// Teardown order: listeners, then the transport, then the session subtree,
/// then the armed disconnect action.
pub(crate) struct SessionLifecycle {
    store: Arc<dyn SignalingStore>,
    session_root: String,
    subscriptions: Vec<SubscriptionId>,
    disconnect_action: Option<DisconnectActionId>,
    torn_down: bool,
}

impl SessionLifecycle {
    pub(crate) fn new(store: Arc<dyn SignalingStore>, paths: &SessionPaths) -> Self {
        Self {
            store,
            session_root: paths.root().to_owned(),
            subscriptions: Vec::new(),
            disconnect_action: None,
            torn_down: false,
        }
    }

    /// Asks the store to wipe the session if this participant vanishes.
    pub(crate) async fn arm_disconnect_cleanup(&mut self) {
        match self
            .store
            .register_disconnect_action(&self.session_root, DisconnectAction::DeleteSubtree)
            .await
        {
            Ok(id) => self.disconnect_action = Some(id),
            Err(e) => warn!(
                "Failed to arm disconnect cleanup for {}: {}",
                self.session_root, e
            ),
        }
    }

    /// Subscribes `path`, forwarding its events into `sink`.
    pub(crate) async fn subscribe(&mut self, path: &str, sink: mpsc::UnboundedSender<StoreEvent>) {
        let on_change: ChangeHandler = Box::new(move |event| {
            let _ = sink.send(event);
        });

        match self.store.subscribe(path, on_change).await {
            Ok(id) => {
                debug!("Subscribed to {}", path);
                self.subscriptions.push(id);
            }
            Err(e) => warn!("Failed to subscribe to {}: {}", path, e),
        }
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Releases listeners, the transport and the store state. Only `Leave`
    /// deletes the subtree. Returns `false` if teardown already happened.
    pub(crate) async fn teardown(
        &mut self,
        engine: &dyn TransportEngine,
        reason: TeardownReason,
    ) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        info!("Tearing down {} ({:?})", self.session_root, reason);

        for id in self.subscriptions.drain(..) {
            if let Err(e) = self.store.unsubscribe(id).await {
                debug!("Unsubscribe {:?} failed: {}", id, e);
            }
        }

        if let Err(e) = engine.close().await {
            warn!("Failed to close transport: {:#}", e);
        }

        match reason {
            TeardownReason::ConnectionLost => {
                self.disconnect_action = None;
                return true;
            }
            TeardownReason::SessionRemoved => {}
            TeardownReason::Leave => {
                if let Err(e) = self.store.delete_subtree(&self.session_root).await {
                    warn!("Failed to delete {}: {}", self.session_root, e);
                }
            }
        }

        if let Some(id) = self.disconnect_action.take() {
            if let Err(e) = self.store.cancel_disconnect_action(id).await {
                debug!("Cancel disconnect action failed: {}", e);
            }
        }
        true
    }
}
