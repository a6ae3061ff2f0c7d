pub mod sdp_type;
pub mod session_description;

pub use sdp_type::RTCSdpType;
pub use session_description::RTCSessionDescription;

pub(crate) const UNSPECIFIED_STR: &str = "Unspecified";
