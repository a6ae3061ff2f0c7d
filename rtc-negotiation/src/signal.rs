use serde::{Deserialize, Serialize};

use crate::candidate::RTCIceCandidate;
use crate::sdp::RTCSessionDescription;
use shared::error::Result;

/// A record exchanged with the remote peer over the signaling transport.
///
/// The transport itself is up to the application; this type only fixes the
/// JSON shape:
///
/// ```text
/// {"kind":"description","data":{"type":"offer","sdp":"v=0..."}}
/// {"kind":"candidate","data":{"candidate":"candidate:...","sdpMLineIndex":0,"sdpMid":"0"}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum RTCSignalMessage {
    Description(RTCSessionDescription),
    Candidate(RTCIceCandidate),
}

impl RTCSignalMessage {
    pub fn marshal(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn unmarshal(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl From<RTCSessionDescription> for RTCSignalMessage {
    fn from(description: RTCSessionDescription) -> Self {
        RTCSignalMessage::Description(description)
    }
}

impl From<RTCIceCandidate> for RTCSignalMessage {
    fn from(candidate: RTCIceCandidate) -> Self {
        RTCSignalMessage::Candidate(candidate)
    }
}
