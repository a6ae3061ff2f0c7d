use std::fmt;

/// Which side of the offer/answer exchange this session plays.
///
/// The role is unset until the first description is created or received and
/// stays fixed for the rest of the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RTCNegotiationRole {
    /// Creates the offer, applies the remote answer.
    Caller,
    /// Applies the remote offer, creates the answer.
    Callee,
}

impl fmt::Display for RTCNegotiationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCNegotiationRole::Caller => write!(f, "caller"),
            RTCNegotiationRole::Callee => write!(f, "callee"),
        }
    }
}
