//! The boundary between the negotiation core and the underlying media engine.
//!
//! The core never creates or applies descriptions itself: it asks a
//! [`MediaEngine`] to do so and waits for the engine to report back through
//! an [`EngineEventSink`]. Engine calls must return without blocking; all
//! completions arrive later, possibly from a thread owned by the engine.

use log::trace;
use tokio::sync::mpsc;

use crate::candidate::RTCIceCandidate;
use crate::configuration::{RTCAnswerOptions, RTCConfiguration, RTCOfferOptions};
use crate::event::BusMessage;
use crate::sdp::RTCSessionDescription;
use crate::session::SessionId;
use shared::error::{Error, FailureSeverity, Result};

/// Correlates an engine completion with the request that caused it.
pub type OperationId = u64;

/// A failure reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFailure {
    pub severity: FailureSeverity,
    pub reason: String,
}

impl EngineFailure {
    pub fn transient(reason: impl Into<String>) -> Self {
        Self {
            severity: FailureSeverity::Transient,
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self {
            severity: FailureSeverity::Fatal,
            reason: reason.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == FailureSeverity::Fatal
    }
}

impl From<Error> for EngineFailure {
    /// Synchronous dispatch errors keep their severity when the engine
    /// already classified them; anything else is treated as transient.
    fn from(err: Error) -> Self {
        match err {
            Error::ErrNegotiationFailed { severity, reason } => Self { severity, reason },
            other => Self::transient(other.to_string()),
        }
    }
}

impl From<EngineFailure> for Error {
    fn from(failure: EngineFailure) -> Self {
        Error::ErrNegotiationFailed {
            severity: failure.severity,
            reason: failure.reason,
        }
    }
}

/// Completions and notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The offer or answer requested by `op` was created.
    DescriptionCreated {
        op: OperationId,
        description: RTCSessionDescription,
    },
    /// The local or remote description passed with `op` was applied.
    DescriptionApplied { op: OperationId },
    /// Creating or applying the description for `op` failed.
    DescriptionFailed {
        op: OperationId,
        failure: EngineFailure,
    },
    /// The engine gathered a local candidate.
    LocalCandidate(RTCIceCandidate),
    /// The engine connection broke outside of any operation.
    ConnectionFailed(EngineFailure),
}

impl EngineEvent {
    pub(crate) fn operation_id(&self) -> Option<OperationId> {
        match self {
            EngineEvent::DescriptionCreated { op, .. }
            | EngineEvent::DescriptionApplied { op }
            | EngineEvent::DescriptionFailed { op, .. } => Some(*op),
            EngineEvent::LocalCandidate(_) | EngineEvent::ConnectionFailed(_) => None,
        }
    }
}

/// The peer connection handle owned by one session.
///
/// Every method dispatches the request and returns immediately. A returned
/// `Err` is handled exactly like a `DescriptionFailed` event for the same
/// operation.
pub trait MediaEngine: Send + Sync {
    fn create_offer(&self, op: OperationId, options: &RTCOfferOptions) -> Result<()>;

    fn create_answer(&self, op: OperationId, options: &RTCAnswerOptions) -> Result<()>;

    fn set_local_description(
        &self,
        op: OperationId,
        description: &RTCSessionDescription,
    ) -> Result<()>;

    fn set_remote_description(
        &self,
        op: OperationId,
        description: &RTCSessionDescription,
    ) -> Result<()>;

    fn add_ice_candidate(&self, candidate: &RTCIceCandidate) -> Result<()>;

    /// Releases the underlying connection. Called exactly once.
    fn close(&self);
}

/// Produces the engine for a new session.
pub trait MediaEngineFactory {
    type Engine: MediaEngine + 'static;

    fn create_engine(
        &self,
        config: &RTCConfiguration,
        sink: EngineEventSink,
    ) -> Result<Self::Engine>;
}

/// The engine's handle for reporting back to its session.
///
/// Cheap to clone and usable from any thread. Events are queued in emission
/// order and processed one at a time by the session.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    session_id: SessionId,
    inbox: mpsc::UnboundedSender<BusMessage>,
}

impl EngineEventSink {
    pub(crate) fn new(session_id: SessionId, inbox: mpsc::UnboundedSender<BusMessage>) -> Self {
        Self { session_id, inbox }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Hands `event` to the session. Returns false once the session is gone,
    /// in which case the event is dropped.
    pub fn emit(&self, event: EngineEvent) -> bool {
        trace!("session {}: engine emitted {:?}", self.session_id, event);
        self.inbox.send(BusMessage::Engine(event)).is_ok()
    }
}
