use crate::transport::RemoteStream;
use rendezvous_core::IceCandidate;

/// Events the transport engine reports back to its coordinator.
#[derive(Debug)]
pub enum TransportEvent {
    /// Trickle ICE: a local candidate that must reach the peer.
    LocalCandidate(IceCandidate),

    /// Media from the peer is ready to be rendered.
    RemoteStreamAvailable(RemoteStream),

    /// Underlying link state, informational only.
    LinkStateChanged(LinkState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}
