use std::collections::{HashSet, VecDeque};

use log::{debug, trace, warn};

use super::{CandidateKey, RTCIceCandidate};
use crate::engine::{EngineFailure, MediaEngine};
use crate::event::EventBus;
use crate::session::SessionId;
use shared::error::{Error, Result};

/// What happened to a remote candidate handed to the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CandidateDisposition {
    /// Both descriptions were set; the candidate went straight to the engine.
    Applied,
    /// The candidate arrived early and waits for the descriptions.
    Queued,
    /// The same candidate was already received; nothing was done.
    Duplicate,
}

/// Holds remote candidates until the session can apply them, and relays
/// local ones.
///
/// Remote candidates are applied strictly in arrival order and at most once.
/// The buffer lives inside the session lock, so receipt and flush never
/// interleave.
#[derive(Debug)]
pub struct CandidateBuffer {
    session_id: SessionId,
    pending: VecDeque<RTCIceCandidate>,
    seen: HashSet<CandidateKey>,
    ready: bool,
}

impl CandidateBuffer {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            pending: VecDeque::new(),
            seen: HashSet::new(),
            ready: false,
        }
    }

    /// Whether both descriptions are set and candidates go straight through.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of remote candidates waiting for the descriptions.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Publishes a candidate gathered by the local engine.
    pub fn on_local_candidate_discovered(&self, candidate: RTCIceCandidate, bus: &mut EventBus) {
        trace!("session {}: local candidate {}", self.session_id, candidate);
        bus.publish_local_candidate(candidate);
    }

    /// Applies `candidate` now if the session is ready, otherwise queues it.
    ///
    /// Re-delivery of a candidate already received fails with
    /// `ErrDuplicateCandidate` and leaves the buffer untouched. A candidate
    /// the engine refuses is reported as a transient `ErrNegotiationFailed`
    /// and is not remembered, so the remote peer may send it again.
    pub fn on_remote_candidate_received(
        &mut self,
        candidate: RTCIceCandidate,
        engine: &dyn MediaEngine,
    ) -> Result<CandidateDisposition> {
        let key = candidate.key();
        if self.seen.contains(&key) {
            debug!(
                "session {}: ignoring duplicate remote candidate {}",
                self.session_id, candidate
            );
            return Err(Error::ErrDuplicateCandidate);
        }

        if self.ready {
            self.apply(&candidate, engine)?;
            self.seen.insert(key);
            Ok(CandidateDisposition::Applied)
        } else {
            debug!(
                "session {}: queueing remote candidate {} ({} pending)",
                self.session_id,
                candidate,
                self.pending.len() + 1
            );
            self.seen.insert(key);
            self.pending.push_back(candidate);
            Ok(CandidateDisposition::Queued)
        }
    }

    /// Marks the session ready and applies every queued candidate in arrival
    /// order. Returns how many the engine accepted.
    ///
    /// A refused candidate does not stop the others; it is forgotten so a
    /// later re-delivery is applied instead of reported as a duplicate.
    pub fn flush(&mut self, engine: &dyn MediaEngine) -> usize {
        self.ready = true;

        if !self.pending.is_empty() {
            debug!(
                "session {}: flushing {} queued remote candidates",
                self.session_id,
                self.pending.len()
            );
        }
        let mut applied = 0;
        while let Some(candidate) = self.pending.pop_front() {
            if self.apply(&candidate, engine).is_ok() {
                applied += 1;
            } else {
                self.seen.remove(&candidate.key());
            }
        }
        applied
    }

    /// Drops queued candidates without applying them.
    pub fn clear(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                "session {}: discarding {} queued remote candidates",
                self.session_id,
                self.pending.len()
            );
        }
        self.pending.clear();
    }

    fn apply(&self, candidate: &RTCIceCandidate, engine: &dyn MediaEngine) -> Result<()> {
        trace!("session {}: add_ice_candidate {}", self.session_id, candidate);
        engine.add_ice_candidate(candidate).map_err(|err| {
            warn!(
                "session {}: failed to apply remote candidate {}: {}",
                self.session_id, candidate, err
            );
            // a refused candidate never fails the session
            Error::from(EngineFailure::transient(EngineFailure::from(err).reason))
        })
    }
}
