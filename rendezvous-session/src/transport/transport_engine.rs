use crate::transport::{TransportConfig, TransportEvent};
use anyhow::Result;
use async_trait::async_trait;
use rendezvous_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// Control surface of the local media transport. Descriptions and candidates
/// pass through untouched.
#[async_trait]
pub trait TransportEngine: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Stop local media and release the connection.
    async fn close(&self) -> Result<()>;
}

/// Builds one engine per call. A failure here is reported to the caller of
/// `start` as `TransportUnavailable`.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn TransportEngine>>;
}
