use async_trait::async_trait;
use rendezvous_session::{
    ChangeHandler, Claim, DisconnectAction, DisconnectActionId, ItemId, MemoryClient,
    SignalingStore, StoreError, SubscriptionId,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Wraps a [`MemoryClient`] with switchable write failures and duplicated
/// notifications, to exercise the coordinator's failure paths.
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryClient,
    fail_appends: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    duplicate_events: bool,
}

impl FlakyStore {
    pub fn new(inner: MemoryClient) -> Self {
        Self {
            inner,
            fail_appends: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            duplicate_events: false,
        }
    }

    /// Deliver every notification twice (at-least-once delivery).
    pub fn duplicating(inner: MemoryClient) -> Self {
        Self {
            duplicate_events: true,
            ..Self::new(inner)
        }
    }

    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SignalingStore for FlakyStore {
    async fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &str, value: String) -> Result<(), StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.write(path, value).await
    }

    async fn write_if_absent(&self, path: &str, value: String) -> Result<Claim, StoreError> {
        self.check(&self.fail_writes)?;
        self.inner.write_if_absent(path, value).await
    }

    async fn append(&self, path: &str, value: String) -> Result<ItemId, StoreError> {
        self.check(&self.fail_appends)?;
        self.inner.append(path, value).await
    }

    async fn subscribe(
        &self,
        path: &str,
        on_change: ChangeHandler,
    ) -> Result<SubscriptionId, StoreError> {
        if !self.duplicate_events {
            return self.inner.subscribe(path, on_change).await;
        }
        let twice: ChangeHandler = Box::new(move |event| {
            on_change(event.clone());
            on_change(event);
        });
        self.inner.subscribe(path, twice).await
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), StoreError> {
        self.inner.unsubscribe(id).await
    }

    async fn delete_subtree(&self, path: &str) -> Result<(), StoreError> {
        self.inner.delete_subtree(path).await
    }

    async fn register_disconnect_action(
        &self,
        path: &str,
        action: DisconnectAction,
    ) -> Result<DisconnectActionId, StoreError> {
        self.inner.register_disconnect_action(path, action).await
    }

    async fn cancel_disconnect_action(&self, id: DisconnectActionId) -> Result<(), StoreError> {
        self.inner.cancel_disconnect_action(id).await
    }
}
