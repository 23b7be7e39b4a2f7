use serde::{Deserialize, Serialize};
use std::fmt;

/// Negotiation role of the local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Undetermined,
    Offerer,
    Answerer,
}

/// Connection phase surfaced to the caller for status display.
///
/// `Idle -> Negotiating -> Connected`, `Negotiating -> Failed` when the
/// negotiation deadline passes, and any phase `-> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Negotiating,
    Connected,
    Failed,
    Closed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Closed)
    }

    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_become(self, next: Phase) -> bool {
        match (self, next) {
            (Phase::Closed, _) => false,
            (_, Phase::Closed) => true,
            (Phase::Idle, Phase::Negotiating) => true,
            (Phase::Negotiating, Phase::Connected) => true,
            (Phase::Negotiating, Phase::Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Negotiating => "negotiating",
            Phase::Connected => "connected",
            Phase::Failed => "failed",
            Phase::Closed => "closed",
        };
        f.write_str(label)
    }
}
