pub mod connection_state;
pub mod role;

pub use connection_state::{
    ConnectionStateTracker, RTCConnectionState, StateChangeOp, check_next_connection_state,
};
pub use role::RTCNegotiationRole;
