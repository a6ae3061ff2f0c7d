pub mod buffer;

pub use buffer::{CandidateBuffer, CandidateDisposition};

use std::fmt;

use serde::{Deserialize, Serialize};

/// ICECandidate represents an ice candidate as exchanged over signaling.
///
/// The candidate line is opaque to this crate: it is neither parsed nor
/// normalized, so what the engine gathered is exactly what the remote peer
/// receives.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: u16,
    pub sdp_mid: String,
    /// The URL of the STUN or TURN server used to gather this candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RTCIceCandidate {
    pub fn new(candidate: String, sdp_mline_index: u16, sdp_mid: String) -> Self {
        Self {
            candidate,
            sdp_mline_index,
            sdp_mid,
            url: None,
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    /// Identity used to detect re-delivered remote candidates. The gathering
    /// server url is not part of it.
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            candidate: self.candidate.clone(),
            sdp_mline_index: self.sdp_mline_index,
            sdp_mid: self.sdp_mid.clone(),
        }
    }
}

impl fmt::Display for RTCIceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (mid={}, mline={})",
            self.candidate, self.sdp_mid, self.sdp_mline_index
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    candidate: String,
    sdp_mline_index: u16,
    sdp_mid: String,
}
