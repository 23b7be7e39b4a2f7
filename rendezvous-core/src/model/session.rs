use serde::{Deserialize, Serialize};
use std::fmt;

const SESSIONS_ROOT: &str = "sessions";

/// Externally supplied call identifier (the mentorship-request id).
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn paths(&self) -> SessionPaths {
        SessionPaths::new(self)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store locations owned by one session: `sessions/{id}/...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPaths {
    root: String,
}

impl SessionPaths {
    pub fn new(session_id: &SessionId) -> Self {
        Self {
            root: format!("{SESSIONS_ROOT}/{}", session_id.as_str()),
        }
    }

    /// The whole subtree, removed on leave or disconnect.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn offer(&self) -> String {
        format!("{}/offer", self.root)
    }

    pub fn answer(&self) -> String {
        format!("{}/answer", self.root)
    }

    /// Slot claimed atomically by whichever participant becomes the offerer.
    pub fn offerer(&self) -> String {
        format!("{}/offerer", self.root)
    }

    pub fn candidates(&self) -> String {
        format!("{}/candidates", self.root)
    }
}
