mod config;
mod coordinator;
mod error;
mod store;
mod transport;

pub use config::*;
pub use coordinator::*;
pub use error::*;
pub use store::*;
pub use transport::*;

pub use rendezvous_core::model::{
    CandidateEnvelope, IceCandidate, IceServerConfig, ParticipantId, Phase, Role, SdpKind,
    SessionDescription, SessionId, SessionPaths,
};
