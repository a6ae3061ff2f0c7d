use std::fmt;

use crate::sdp::UNSPECIFIED_STR;
use shared::error::{Error, Result};

/// An event that asks the tracker to move the connection forward.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum StateChangeOp {
    /// A locally created offer was applied by the engine.
    #[default]
    SetLocalOffer,
    /// A remote offer was applied by the engine.
    SetRemoteOffer,
    /// A locally created answer was applied by the engine.
    SetLocalAnswer,
    /// A remote answer was applied by the engine.
    SetRemoteAnswer,
    /// The engine completed negotiation after the local answer.
    Complete,
    /// The session was closed by the application.
    Close,
    /// The engine reported an unrecoverable error.
    Fail,
}

impl fmt::Display for StateChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StateChangeOp::SetLocalOffer => write!(f, "SetLocal(offer)"),
            StateChangeOp::SetRemoteOffer => write!(f, "SetRemote(offer)"),
            StateChangeOp::SetLocalAnswer => write!(f, "SetLocal(answer)"),
            StateChangeOp::SetRemoteAnswer => write!(f, "SetRemote(answer)"),
            StateChangeOp::Complete => write!(f, "Complete"),
            StateChangeOp::Close => write!(f, "Close"),
            StateChangeOp::Fail => write!(f, "Fail"),
        }
    }
}

/// Indicates where a session is in the offer/answer negotiation.
///
/// ```text
/// Caller: New → (local offer)  → HaveLocalOffer  → (remote answer) → Stable
/// Callee: New → (remote offer) → HaveRemoteOffer → (local answer)  → HaveLocalAnswer → Stable
/// any non-terminal state → Closed | Failed
/// ```
///
/// `Closed` and `Failed` are terminal.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RTCConnectionState {
    /// State not specified. This should not occur in normal operation.
    Unspecified = 0,

    /// No description has been applied yet. This is the default state.
    #[default]
    New,

    /// A local offer has been applied, waiting for the remote answer.
    HaveLocalOffer,

    /// A remote offer has been applied, a local answer is needed.
    HaveRemoteOffer,

    /// The local answer has been applied, the engine is completing
    /// negotiation.
    HaveLocalAnswer,

    /// Offer and answer are both applied.
    Stable,

    /// The session was closed; no further operations are possible.
    Closed,

    /// The engine reported an unrecoverable error.
    Failed,
}

const CONNECTION_STATE_NEW_STR: &str = "new";
const CONNECTION_STATE_HAVE_LOCAL_OFFER_STR: &str = "have-local-offer";
const CONNECTION_STATE_HAVE_REMOTE_OFFER_STR: &str = "have-remote-offer";
const CONNECTION_STATE_HAVE_LOCAL_ANSWER_STR: &str = "have-local-answer";
const CONNECTION_STATE_STABLE_STR: &str = "stable";
const CONNECTION_STATE_CLOSED_STR: &str = "closed";
const CONNECTION_STATE_FAILED_STR: &str = "failed";

impl From<&str> for RTCConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            CONNECTION_STATE_NEW_STR => RTCConnectionState::New,
            CONNECTION_STATE_HAVE_LOCAL_OFFER_STR => RTCConnectionState::HaveLocalOffer,
            CONNECTION_STATE_HAVE_REMOTE_OFFER_STR => RTCConnectionState::HaveRemoteOffer,
            CONNECTION_STATE_HAVE_LOCAL_ANSWER_STR => RTCConnectionState::HaveLocalAnswer,
            CONNECTION_STATE_STABLE_STR => RTCConnectionState::Stable,
            CONNECTION_STATE_CLOSED_STR => RTCConnectionState::Closed,
            CONNECTION_STATE_FAILED_STR => RTCConnectionState::Failed,
            _ => RTCConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for RTCConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCConnectionState::New => CONNECTION_STATE_NEW_STR,
            RTCConnectionState::HaveLocalOffer => CONNECTION_STATE_HAVE_LOCAL_OFFER_STR,
            RTCConnectionState::HaveRemoteOffer => CONNECTION_STATE_HAVE_REMOTE_OFFER_STR,
            RTCConnectionState::HaveLocalAnswer => CONNECTION_STATE_HAVE_LOCAL_ANSWER_STR,
            RTCConnectionState::Stable => CONNECTION_STATE_STABLE_STR,
            RTCConnectionState::Closed => CONNECTION_STATE_CLOSED_STR,
            RTCConnectionState::Failed => CONNECTION_STATE_FAILED_STR,
            RTCConnectionState::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

impl RTCConnectionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RTCConnectionState::Closed | RTCConnectionState::Failed)
    }
}

/// Returns the state reached by applying `op` in `cur`, or the error that
/// rejects it.
pub fn check_next_connection_state(
    cur: RTCConnectionState,
    op: StateChangeOp,
) -> Result<RTCConnectionState> {
    // terminal states reject everything
    match cur {
        RTCConnectionState::Closed => return Err(Error::ErrSessionClosed),
        RTCConnectionState::Failed => return Err(Error::ErrSessionFailed),
        _ => {}
    }

    match op {
        StateChangeOp::Close => return Ok(RTCConnectionState::Closed),
        StateChangeOp::Fail => return Ok(RTCConnectionState::Failed),
        _ => {}
    }

    let next = match (cur, op) {
        // new->SetLocal(offer)->have-local-offer
        (RTCConnectionState::New, StateChangeOp::SetLocalOffer) => {
            Some(RTCConnectionState::HaveLocalOffer)
        }
        // new->SetRemote(offer)->have-remote-offer
        (RTCConnectionState::New, StateChangeOp::SetRemoteOffer) => {
            Some(RTCConnectionState::HaveRemoteOffer)
        }
        // have-local-offer->SetRemote(answer)->stable
        (RTCConnectionState::HaveLocalOffer, StateChangeOp::SetRemoteAnswer) => {
            Some(RTCConnectionState::Stable)
        }
        // have-remote-offer->SetLocal(answer)->have-local-answer
        (RTCConnectionState::HaveRemoteOffer, StateChangeOp::SetLocalAnswer) => {
            Some(RTCConnectionState::HaveLocalAnswer)
        }
        // have-local-answer->Complete->stable
        (RTCConnectionState::HaveLocalAnswer, StateChangeOp::Complete) => {
            Some(RTCConnectionState::Stable)
        }
        _ => None,
    };

    next.ok_or_else(|| Error::ErrInvalidTransition(format!("from {cur} applying {op}")))
}

/// Tracks the lifecycle state of one session.
///
/// The tracker is consulted and mutated by the negotiator; it never drives
/// the engine itself.
#[derive(Default, Debug)]
pub struct ConnectionStateTracker {
    state: RTCConnectionState,
}

impl ConnectionStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> RTCConnectionState {
        self.state
    }

    /// Checks `op` against the current state without applying it.
    pub fn check(&self, op: StateChangeOp) -> Result<RTCConnectionState> {
        check_next_connection_state(self.state, op)
    }

    /// Applies `op`, returning the new state. On error the state is left
    /// unchanged.
    pub fn transition(&mut self, op: StateChangeOp) -> Result<RTCConnectionState> {
        let next = check_next_connection_state(self.state, op)?;
        self.state = next;
        Ok(next)
    }

    /// Fails with the terminal error of a closed or failed session.
    pub fn ensure_active(&self) -> Result<()> {
        match self.state {
            RTCConnectionState::Closed => Err(Error::ErrSessionClosed),
            RTCConnectionState::Failed => Err(Error::ErrSessionFailed),
            _ => Ok(()),
        }
    }
}
