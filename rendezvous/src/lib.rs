pub use rendezvous_core::model::{ParticipantId, Phase, Role, SessionId};

pub mod model {
    pub use rendezvous_core::model::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use rendezvous_session::*;
}
