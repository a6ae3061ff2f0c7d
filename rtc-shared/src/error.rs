use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a remote session description was refused.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Both peers sent an offer. The caller must roll back one side.
    Glare,
    /// An offer arrived when the session cannot take one.
    UnexpectedOffer,
    /// An answer arrived without a matching local offer.
    UnexpectedAnswer,
    /// The description carries neither "offer" nor "answer".
    UnspecifiedType,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RejectReason::Glare => "glare",
            RejectReason::UnexpectedOffer => "unexpected offer",
            RejectReason::UnexpectedAnswer => "unexpected answer",
            RejectReason::UnspecifiedType => "unspecified description type",
        };
        write!(f, "{s}")
    }
}

/// How bad an engine-reported failure is.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailureSeverity {
    /// The engine could not complete the request now (e.g. busy); the
    /// session stays usable.
    #[default]
    Transient,
    /// The engine connection is unusable; the session moves to failed.
    Fatal,
}

impl fmt::Display for FailureSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FailureSeverity::Transient => write!(f, "transient"),
            FailureSeverity::Fatal => write!(f, "fatal"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ErrInvalidTransition indicates an operation that is not legal from the
    /// current connection state.
    #[error("invalid proposed connection state transition: {0}")]
    ErrInvalidTransition(String),

    /// ErrOperationInProgress indicates that a description operation of the
    /// same direction is still waiting for the engine.
    #[error("description operation already in progress: {0}")]
    ErrOperationInProgress(String),

    /// ErrRejectedDescription indicates a remote description that conflicts
    /// with the current role or state.
    #[error("remote description rejected: {0}")]
    ErrRejectedDescription(RejectReason),

    /// ErrDuplicateCandidate indicates a remote candidate that was already
    /// received by this session.
    #[error("duplicate remote ice candidate")]
    ErrDuplicateCandidate,

    /// ErrNegotiationFailed indicates that the engine failed to create or
    /// apply a session description.
    #[error("negotiation failed ({severity}): {reason}")]
    ErrNegotiationFailed {
        severity: FailureSeverity,
        reason: String,
    },

    /// ErrSessionClosed indicates an operation executed after the session
    /// has been closed.
    #[error("session closed")]
    ErrSessionClosed,

    /// ErrSessionFailed indicates an operation executed after the engine
    /// reported an unrecoverable failure.
    #[error("session failed")]
    ErrSessionFailed,

    /// ErrNoRuntime indicates that a session was created outside of a tokio
    /// runtime, so the event dispatcher cannot be started.
    #[error("no tokio runtime available for the session event dispatcher")]
    ErrNoRuntime,

    /// ErrEngineUnavailable indicates that the engine factory could not
    /// provide a peer connection handle.
    #[error("media engine unavailable: {0}")]
    ErrEngineUnavailable(String),

    /// ErrInvalidIceServer indicates an ICE server entry without usable urls.
    #[error("invalid ice server: {0}")]
    ErrInvalidIceServer(String),

    /// ErrNoTurnCredentials indicates that a TURN server URL was provided
    /// without required credentials.
    #[error("turn server credentials required")]
    ErrNoTurnCredentials,

    /// ErrSignalMessage indicates a signaling record that could not be
    /// encoded or decoded.
    #[error("signal message: {0}")]
    ErrSignalMessage(String),
}

impl Error {
    /// Whether the error means the session can never be used again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Error::ErrSessionClosed
                | Error::ErrSessionFailed
                | Error::ErrNegotiationFailed {
                    severity: FailureSeverity::Fatal,
                    ..
                }
        )
    }

    /// Whether repeating the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ErrOperationInProgress(_)
                | Error::ErrNegotiationFailed {
                    severity: FailureSeverity::Transient,
                    ..
                }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ErrSignalMessage(e.to_string())
    }
}
