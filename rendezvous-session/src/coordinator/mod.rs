mod candidate_buffer;
mod coordinator_command;
mod lifecycle;
mod negotiation;
mod session_coordinator;

pub use session_coordinator::*;
