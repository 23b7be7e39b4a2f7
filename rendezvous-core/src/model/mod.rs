mod negotiation;
mod participant;
mod session;
mod signaling;

pub use negotiation::{Phase, Role};
pub use participant::ParticipantId;
pub use session::{SessionId, SessionPaths};
pub use signaling::{CandidateEnvelope, IceCandidate, IceServerConfig, SdpKind, SessionDescription};
