use thiserror::Error;

/// Errors raised by a [`SignalingStore`](crate::SignalingStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection is closed")]
    Disconnected,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode store value: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Failures of a call. Only `TransportUnavailable` and `AlreadyStarted` ever
/// reach the caller; the rest are logged by the coordinator while the call
/// keeps its current phase.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("transport unavailable: {0:#}")]
    TransportUnavailable(anyhow::Error),

    #[error("signaling write to {path} failed: {source}")]
    SignalingWriteFailed {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("candidate arrived after the transport was closed")]
    StaleCandidateApplication,

    #[error("{path} already holds a value written by the other participant")]
    DuplicateRoleWrite { path: String },

    #[error("coordinator was already started")]
    AlreadyStarted,
}

impl CallError {
    pub(crate) fn write_failed(path: impl Into<String>, source: StoreError) -> Self {
        Self::SignalingWriteFailed {
            path: path.into(),
            source,
        }
    }
}
