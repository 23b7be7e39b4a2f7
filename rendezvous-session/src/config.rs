use crate::transport::TransportConfig;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_NEGOTIATION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_EVENT_BUFFER: usize = 256;

/// Settings for one [`SessionCoordinator`](crate::SessionCoordinator).
///
/// Deserializes from JSON with every field optional:
///
/// ```json
/// { "negotiation_timeout_ms": 10000, "transport": { "media": { "video": false } } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub transport: TransportConfig,
    /// Time allowed in `Negotiating` before the call is marked `Failed`.
    /// `None` waits forever.
    pub negotiation_timeout_ms: Option<u64>,
    /// Drop entries of the shared candidate list that this participant wrote.
    pub filter_own_candidates: bool,
    /// Capacity of the transport and command queues feeding the coordinator.
    pub event_buffer: usize,
}

impl CoordinatorConfig {
    pub fn negotiation_timeout(&self) -> Option<Duration> {
        self.negotiation_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_negotiation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.negotiation_timeout_ms =
            timeout.map(|t| u64::try_from(t.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            negotiation_timeout_ms: Some(DEFAULT_NEGOTIATION_TIMEOUT_MS),
            filter_own_candidates: true,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}
