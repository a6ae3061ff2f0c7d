use serde::{Deserialize, Serialize};

use shared::error::{Error, Result};

const STUN_SCHEMES: [&str; 2] = ["stun:", "stuns:"];
const TURN_SCHEMES: [&str; 2] = ["turn:", "turns:"];

/// ICEServer describes a single STUN and TURN server that can be used by
/// the engine to establish a connection with a peer.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCIceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

impl RTCIceServer {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.urls.is_empty() {
            return Err(Error::ErrInvalidIceServer("no urls".to_owned()));
        }

        for url in &self.urls {
            if TURN_SCHEMES.iter().any(|s| url.starts_with(s)) {
                if self.username.is_empty() || self.credential.is_empty() {
                    return Err(Error::ErrNoTurnCredentials);
                }
            } else if !STUN_SCHEMES.iter().any(|s| url.starts_with(s)) {
                return Err(Error::ErrInvalidIceServer(format!("unknown scheme in {url}")));
            }
        }

        Ok(())
    }
}
