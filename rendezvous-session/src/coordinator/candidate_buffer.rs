use crate::error::CallError;
use crate::transport::TransportEngine;
use rendezvous_core::IceCandidate;
use std::collections::VecDeque;
use tracing::{debug, warn};

enum BufferState {
    /// Remote description not set yet; candidates wait here in arrival order.
    Buffering(VecDeque<IceCandidate>),
    Flushed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CandidateOutcome {
    Queued,
    Applied,
    Rejected,
    Ignored,
}

/// Holds remote candidates until the engine can accept them.
pub(crate) struct CandidateBuffer {
    state: BufferState,
}

impl CandidateBuffer {
    pub(crate) fn new() -> Self {
        Self {
            state: BufferState::Buffering(VecDeque::new()),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        match &self.state {
            BufferState::Buffering(queue) => queue.len(),
            _ => 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_flushed(&self) -> bool {
        matches!(self.state, BufferState::Flushed)
    }

    pub(crate) async fn on_remote_candidate(
        &mut self,
        candidate: IceCandidate,
        engine: &dyn TransportEngine,
    ) -> CandidateOutcome {
        match &mut self.state {
            BufferState::Buffering(queue) => {
                queue.push_back(candidate);
                debug!("Queued remote candidate ({} pending)", queue.len());
                CandidateOutcome::Queued
            }
            BufferState::Flushed => apply(engine, candidate).await,
            BufferState::Closed => {
                debug!("{}", CallError::StaleCandidateApplication);
                CandidateOutcome::Ignored
            }
        }
    }

    /// Applies everything queued so far, oldest first. Only the first call
    /// does anything; the buffer passes candidates straight through afterwards.
    pub(crate) async fn flush(&mut self, engine: &dyn TransportEngine) -> usize {
        let BufferState::Buffering(queue) = &mut self.state else {
            return 0;
        };
        let queued = std::mem::take(queue);
        self.state = BufferState::Flushed;

        let count = queued.len();
        debug!("Flushing {} buffered candidates", count);
        for candidate in queued {
            apply(engine, candidate).await;
        }
        count
    }

    pub(crate) fn close(&mut self) {
        self.state = BufferState::Closed;
    }
}

async fn apply(engine: &dyn TransportEngine, candidate: IceCandidate) -> CandidateOutcome {
    match engine.add_ice_candidate(candidate).await {
        Ok(()) => CandidateOutcome::Applied,
        Err(e) => {
            warn!("Failed to add ICE candidate: {:#}", e);
            CandidateOutcome::Rejected
        }
    }
}
