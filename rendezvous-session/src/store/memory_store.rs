use crate::error::StoreError;
use crate::store::{
    ChangeHandler, Claim, DisconnectAction, DisconnectActionId, ItemId, SignalingStore,
    StoreEvent, SubscriptionId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

type ClientId = u64;

struct Subscriber {
    client: ClientId,
    path: String,
    on_change: ChangeHandler,
}

struct PendingAction {
    client: ClientId,
    path: String,
    action: DisconnectAction,
}

#[derive(Default)]
struct StoreInner {
    data: Mutex<BTreeMap<String, String>>,
    subscribers: DashMap<SubscriptionId, Subscriber>,
    disconnect_actions: DashMap<DisconnectActionId, PendingAction>,
    next_id: AtomicU64,
    next_item: AtomicU64,
    deleted_subtrees: AtomicUsize,
}

/// In-process signaling store shared by every participant that connects to it.
///
/// Each participant talks to it through its own [`MemoryClient`], which
/// models one network connection: dropping it with
/// [`MemoryClient::disconnect`] runs the actions that client armed.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection to the store.
    pub fn connect(&self) -> MemoryClient {
        MemoryClient {
            store: self.clone(),
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn value_at(&self, path: &str) -> Option<String> {
        self.data().get(path).cloned()
    }

    /// Direct children of `path` in append order.
    pub fn children_of(&self, path: &str) -> Vec<(ItemId, String)> {
        let data = self.data();
        children(&data, path)
            .map(|(key, value)| (ItemId(key.to_owned()), value.clone()))
            .collect()
    }

    /// Whether anything is stored at or below `path`.
    pub fn contains_subtree(&self, path: &str) -> bool {
        let data = self.data();
        data.keys().any(|key| is_within(key, path))
    }

    /// Number of deletions that actually removed data.
    pub fn deleted_subtrees(&self) -> usize {
        self.inner.deleted_subtrees.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn pending_disconnect_actions(&self) -> usize {
        self.inner.disconnect_actions.len()
    }

    fn data(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.inner.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_sequence(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn notify(&self, event_for: impl Fn(&str) -> Option<StoreEvent>) {
        for entry in self.inner.subscribers.iter() {
            if let Some(event) = event_for(&entry.path) {
                (entry.on_change)(event);
            }
        }
    }

    fn write_locked(&self, data: &mut BTreeMap<String, String>, path: &str, value: String) {
        data.insert(path.to_owned(), value.clone());
        self.notify(|sub_path| {
            (sub_path == path).then(|| StoreEvent::Value {
                path: path.to_owned(),
                value: value.clone(),
            })
        });
    }

    fn delete_subtree_inner(&self, path: &str) {
        let mut data = self.data();
        let doomed: Vec<String> = data
            .keys()
            .filter(|key| is_within(key, path))
            .cloned()
            .collect();

        if doomed.is_empty() {
            debug!("Nothing to delete under {}", path);
            return;
        }

        for key in &doomed {
            data.remove(key);
        }
        self.inner.deleted_subtrees.fetch_add(1, Ordering::SeqCst);
        info!("Deleted subtree {} ({} entries)", path, doomed.len());

        self.notify(|sub_path| {
            is_within(sub_path, path).then(|| StoreEvent::Removed {
                path: sub_path.to_owned(),
            })
        });
    }
}

fn is_within(key: &str, root: &str) -> bool {
    key == root
        || key
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn children<'a>(
    data: &'a BTreeMap<String, String>,
    path: &'a str,
) -> impl Iterator<Item = (&'a str, &'a String)> + 'a {
    data.iter().filter_map(move |(key, value)| {
        let rest = key.strip_prefix(path)?.strip_prefix('/')?;
        (!rest.contains('/')).then_some((rest, value))
    })
}

/// One connection to a [`MemoryStore`].
#[derive(Clone)]
pub struct MemoryClient {
    store: MemoryStore,
    id: ClientId,
    connected: Arc<AtomicBool>,
}

impl MemoryClient {
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Simulates an abrupt connection loss: the client's subscribers get
    /// `ConnectionLost` and are dropped, then its disconnect actions run.
    pub fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Store client {} disconnected", self.id);

        let owned: Vec<SubscriptionId> = self
            .store
            .inner
            .subscribers
            .iter()
            .filter(|entry| entry.client == self.id)
            .map(|entry| *entry.key())
            .collect();
        for id in owned {
            if let Some((_, subscriber)) = self.store.inner.subscribers.remove(&id) {
                (subscriber.on_change)(StoreEvent::ConnectionLost);
            }
        }

        let armed: Vec<DisconnectActionId> = self
            .store
            .inner
            .disconnect_actions
            .iter()
            .filter(|entry| entry.client == self.id)
            .map(|entry| *entry.key())
            .collect();
        for id in armed {
            if let Some((_, pending)) = self.store.inner.disconnect_actions.remove(&id) {
                match pending.action {
                    DisconnectAction::DeleteSubtree => {
                        self.store.delete_subtree_inner(&pending.path)
                    }
                }
            }
        }
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

#[async_trait]
impl SignalingStore for MemoryClient {
    async fn read(&self, path: &str) -> Result<Option<String>, StoreError> {
        self.ensure_connected()?;
        Ok(self.store.value_at(path))
    }

    async fn write(&self, path: &str, value: String) -> Result<(), StoreError> {
        self.ensure_connected()?;
        let mut data = self.store.data();
        self.store.write_locked(&mut data, path, value);
        Ok(())
    }

    async fn write_if_absent(&self, path: &str, value: String) -> Result<Claim, StoreError> {
        self.ensure_connected()?;
        let mut data = self.store.data();
        if let Some(existing) = data.get(path) {
            return Ok(Claim::Taken(existing.clone()));
        }
        self.store.write_locked(&mut data, path, value);
        Ok(Claim::Claimed)
    }

    async fn append(&self, path: &str, value: String) -> Result<ItemId, StoreError> {
        self.ensure_connected()?;
        let mut data = self.store.data();
        let seq = self.store.inner.next_item.fetch_add(1, Ordering::Relaxed);
        let key = ItemId(format!("{seq:020}"));
        data.insert(format!("{path}/{key}"), value.clone());

        self.store.notify(|sub_path| {
            (sub_path == path).then(|| StoreEvent::ChildAdded {
                path: path.to_owned(),
                key: key.clone(),
                value: value.clone(),
            })
        });
        Ok(key)
    }

    async fn subscribe(
        &self,
        path: &str,
        on_change: ChangeHandler,
    ) -> Result<SubscriptionId, StoreError> {
        self.ensure_connected()?;
        let data = self.store.data();

        if let Some(value) = data.get(path) {
            on_change(StoreEvent::Value {
                path: path.to_owned(),
                value: value.clone(),
            });
        }
        for (key, value) in children(&data, path) {
            on_change(StoreEvent::ChildAdded {
                path: path.to_owned(),
                key: ItemId(key.to_owned()),
                value: value.clone(),
            });
        }

        let id = SubscriptionId(self.store.next_sequence());
        self.store.inner.subscribers.insert(
            id,
            Subscriber {
                client: self.id,
                path: path.to_owned(),
                on_change,
            },
        );
        Ok(id)
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<(), StoreError> {
        self.store.inner.subscribers.remove(&id);
        Ok(())
    }

    async fn delete_subtree(&self, path: &str) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.store.delete_subtree_inner(path);
        Ok(())
    }

    async fn register_disconnect_action(
        &self,
        path: &str,
        action: DisconnectAction,
    ) -> Result<DisconnectActionId, StoreError> {
        self.ensure_connected()?;
        let id = DisconnectActionId(self.store.next_sequence());
        self.store.inner.disconnect_actions.insert(
            id,
            PendingAction {
                client: self.id,
                path: path.to_owned(),
                action,
            },
        );
        Ok(id)
    }

    async fn cancel_disconnect_action(&self, id: DisconnectActionId) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.store.inner.disconnect_actions.remove(&id);
        Ok(())
    }
}
