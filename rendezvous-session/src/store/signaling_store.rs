use crate::error::StoreError;
use crate::store::{Claim, DisconnectAction, DisconnectActionId, ItemId, StoreEvent, SubscriptionId};
use async_trait::async_trait;

/// Receives store notifications. Called from the store's context; must not block.
pub type ChangeHandler = Box<dyn Fn(StoreEvent) + Send + Sync>;

/// Shared key-value relay both participants negotiate through.
///
/// Paths are `/`-separated. Delivery is at-least-once: handlers may see the
/// same list entry more than once.
#[async_trait]
pub trait SignalingStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<Option<String>, StoreError>;

    async fn write(&self, path: &str, value: String) -> Result<(), StoreError>;

    /// Atomically writes `value` only if nothing is stored at `path`.
    async fn write_if_absent(&self, path: &str, value: String) -> Result<Claim, StoreError>;

    async fn append(&self, path: &str, value: String) -> Result<ItemId, StoreError>;

    /// Registers `on_change` for `path`. The current value (or every existing
    /// list entry) is delivered right away.
    async fn subscribe(&self, path: &str, on_change: ChangeHandler)
    -> Result<SubscriptionId, StoreError>;

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), StoreError>;

    async fn delete_subtree(&self, path: &str) -> Result<(), StoreError>;

    /// Arms `action` on `path`, executed by the store if this connection drops.
    async fn register_disconnect_action(
        &self,
        path: &str,
        action: DisconnectAction,
    ) -> Result<DisconnectActionId, StoreError>;

    async fn cancel_disconnect_action(&self, id: DisconnectActionId) -> Result<(), StoreError>;
}
