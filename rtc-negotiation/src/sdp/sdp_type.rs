use std::fmt;

use super::UNSPECIFIED_STR;
use serde::{Deserialize, Serialize};

/// Describes the type of a session description.
///
/// Only the two halves of an offer/answer exchange are negotiated by this
/// crate. `Unspecified` exists so that a record with an unknown `type` can be
/// represented and explicitly rejected, instead of being read as an answer.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum RTCSdpType {
    #[default]
    Unspecified = 0,

    /// The description is the initial proposal in an offer/answer exchange.
    #[serde(rename = "offer")]
    Offer,

    /// The description is the definitive choice in an offer/answer exchange.
    #[serde(rename = "answer")]
    Answer,
}

const SDP_TYPE_OFFER_STR: &str = "offer";
const SDP_TYPE_ANSWER_STR: &str = "answer";

impl From<&str> for RTCSdpType {
    fn from(raw: &str) -> Self {
        match raw {
            SDP_TYPE_OFFER_STR => RTCSdpType::Offer,
            SDP_TYPE_ANSWER_STR => RTCSdpType::Answer,
            _ => RTCSdpType::Unspecified,
        }
    }
}

impl fmt::Display for RTCSdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCSdpType::Offer => write!(f, "{SDP_TYPE_OFFER_STR}"),
            RTCSdpType::Answer => write!(f, "{SDP_TYPE_ANSWER_STR}"),
            _ => write!(f, "{}", UNSPECIFIED_STR),
        }
    }
}
