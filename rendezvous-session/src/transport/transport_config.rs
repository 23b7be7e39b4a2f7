use rendezvous_core::IceServerConfig;
use serde::Deserialize;

const DEFAULT_STUN_SERVER: &str = "stun:stun.l.google.com:19302";

/// Configuration handed to the transport engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_SERVER)],
            media: MediaConfig::default(),
        }
    }
}

/// Local tracks the engine publishes to the peer.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}
