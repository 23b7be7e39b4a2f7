use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of one entry of an append-only list. Keys sort in append order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notifications delivered to a subscription handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The subscribed field holds `value` (current value on subscribe, then every write).
    Value { path: String, value: String },

    /// A new entry was appended to the subscribed list.
    ChildAdded {
        path: String,
        key: ItemId,
        value: String,
    },

    /// The subscribed path was removed as part of a subtree deletion.
    Removed { path: String },

    /// The subscribing connection dropped; its disconnect actions have fired.
    ConnectionLost,
}

/// Outcome of [`SignalingStore::write_if_absent`](crate::SignalingStore::write_if_absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    Claimed,
    /// Somebody wrote first; carries the value that is already stored.
    Taken(String),
}

/// What the store does on behalf of a client that vanished without cleaning up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectAction {
    DeleteSubtree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisconnectActionId(pub u64);
