use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::sdp_type::RTCSdpType;

/// Represents a session description in the SDP offer/answer model.
///
/// `RTCSessionDescription` is an immutable value: the negotiator produces it,
/// the engine consumes it and the signaling transport carries it to the remote
/// peer. The SDP text is opaque to this crate and is passed through exactly
/// as given, no trimming or re-encoding.
///
/// # Examples
///
/// ```
/// use rtc_negotiation::sdp::{RTCSdpType, RTCSessionDescription};
///
/// let offer = RTCSessionDescription::offer("v=0\r\no=- 1 2 IN IP4 0.0.0.0\r\n".to_owned());
/// assert_eq!(offer.sdp_type(), RTCSdpType::Offer);
///
/// let json = serde_json::to_string(&offer).unwrap();
/// let received: RTCSessionDescription = serde_json::from_str(&json).unwrap();
/// assert_eq!(received, offer);
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RTCSessionDescription {
    #[serde(rename = "type")]
    sdp_type: RTCSdpType,

    sdp: String,
}

impl Display for RTCSessionDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "type: {}, sdp:\n{}",
            self.sdp_type,
            self.sdp.replace("\r\n", "\n")
        )
    }
}

impl RTCSessionDescription {
    /// Given SDP representing an offer, wrap it in an RTCSessionDescription
    /// that can be given to the remote peer.
    pub fn offer(sdp: String) -> RTCSessionDescription {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Offer,
            sdp,
        }
    }

    /// Given SDP representing an answer, wrap it in an RTCSessionDescription
    /// that can be given to the remote peer.
    pub fn answer(sdp: String) -> RTCSessionDescription {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Answer,
            sdp,
        }
    }

    pub(crate) fn new(sdp_type: RTCSdpType, sdp: String) -> RTCSessionDescription {
        RTCSessionDescription { sdp_type, sdp }
    }

    pub fn sdp_type(&self) -> RTCSdpType {
        self.sdp_type
    }

    pub fn sdp(&self) -> &str {
        &self.sdp
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_session_description_json() {
        let tests = vec![
            (
                RTCSessionDescription::offer("sdp".to_owned()),
                r#"{"type":"offer","sdp":"sdp"}"#,
            ),
            (
                RTCSessionDescription::answer("sdp".to_owned()),
                r#"{"type":"answer","sdp":"sdp"}"#,
            ),
            (
                RTCSessionDescription::new(RTCSdpType::Unspecified, "sdp".to_owned()),
                r#"{"type":"Unspecified","sdp":"sdp"}"#,
            ),
        ];

        for (desc, expected_string) in tests {
            let result = serde_json::to_string(&desc);
            assert!(result.is_ok(), "testCase: marshal err: {result:?}");
            let desc_data = result.unwrap();
            assert_eq!(desc_data, expected_string, "string is not expected");

            let result = serde_json::from_str::<RTCSessionDescription>(&desc_data);
            assert!(result.is_ok(), "testCase: unmarshal err: {result:?}");
            if let Ok(sd) = result {
                assert!(sd.sdp == desc.sdp && sd.sdp_type == desc.sdp_type);
            }
        }
    }

    #[test]
    fn test_session_description_payload_is_opaque() {
        let sdp = "  v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\na=x:é \t\r\n\r\n";
        let desc = RTCSessionDescription::offer(sdp.to_owned());

        let json = serde_json::to_string(&desc).unwrap();
        let decoded: RTCSessionDescription = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.sdp().as_bytes(), sdp.as_bytes());
        assert_eq!(decoded.sdp_type(), RTCSdpType::Offer);
    }

    #[test]
    fn test_session_description_unknown_type() {
        let result = serde_json::from_str::<RTCSessionDescription>(r#"{"type":"pranswer","sdp":""}"#);
        assert!(result.is_err());
    }
}
