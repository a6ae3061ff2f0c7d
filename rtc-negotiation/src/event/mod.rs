pub mod subscription;

pub use subscription::Subscription;

use std::fmt;
use std::sync::Arc;

use log::trace;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::candidate::RTCIceCandidate;
use crate::configuration::ReplayPolicy;
use crate::engine::EngineEvent;
use crate::sdp::RTCSessionDescription;
use crate::session::SessionId;
use crate::state::RTCConnectionState;
use shared::error::FailureSeverity;
use subscription::Topic;

/// Notifications a session publishes to its observers, in the order they
/// happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RTCSessionEvent {
    OnLocalCandidate(RTCIceCandidate),
    OnLocalDescription(RTCSessionDescription),
    OnConnectionStateChange(RTCConnectionState),
    OnNegotiationFailed {
        severity: FailureSeverity,
        reason: String,
    },
}

impl fmt::Display for RTCSessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTCSessionEvent::OnLocalCandidate(c) => write!(f, "local candidate {c}"),
            RTCSessionEvent::OnLocalDescription(d) => {
                write!(f, "local description {}", d.sdp_type())
            }
            RTCSessionEvent::OnConnectionStateChange(s) => write!(f, "connection state {s}"),
            RTCSessionEvent::OnNegotiationFailed { severity, reason } => {
                write!(f, "negotiation failed ({severity}): {reason}")
            }
        }
    }
}

/// Messages processed by the session dispatcher.
#[derive(Debug)]
pub(crate) enum BusMessage {
    Engine(EngineEvent),
    Shutdown,
}

/// Receives engine events one at a time, in emission order.
pub(crate) trait EngineEventHandler: Send + Sync + 'static {
    fn handle_engine_event(&self, event: EngineEvent);
}

/// Per-session fan-out of local candidates, local descriptions and session
/// events.
///
/// Publishing happens while the session lock is held, so every subscriber
/// observes events in the order the session produced them.
#[derive(Debug)]
pub struct EventBus {
    session_id: SessionId,
    candidates: Topic<RTCIceCandidate>,
    descriptions: Topic<RTCSessionDescription>,
    events: Topic<RTCSessionEvent>,
}

impl EventBus {
    pub fn new(
        session_id: SessionId,
        candidate_replay: ReplayPolicy,
        description_replay: ReplayPolicy,
    ) -> Self {
        Self {
            session_id,
            candidates: Topic::new(candidate_replay),
            descriptions: Topic::new(description_replay),
            events: Topic::new(ReplayPolicy::None),
        }
    }

    pub fn publish_local_candidate(&mut self, candidate: RTCIceCandidate) {
        self.candidates.publish(candidate.clone());
        self.events
            .publish(RTCSessionEvent::OnLocalCandidate(candidate));
    }

    pub fn publish_local_description(&mut self, description: RTCSessionDescription) {
        self.descriptions.publish(description.clone());
        self.events
            .publish(RTCSessionEvent::OnLocalDescription(description));
    }

    pub fn publish_state_change(&mut self, state: RTCConnectionState) {
        self.events
            .publish(RTCSessionEvent::OnConnectionStateChange(state));
    }

    pub fn publish_negotiation_failed(&mut self, severity: FailureSeverity, reason: String) {
        self.events
            .publish(RTCSessionEvent::OnNegotiationFailed { severity, reason });
    }

    pub fn subscribe_local_candidates(&mut self) -> Subscription<RTCIceCandidate> {
        self.candidates.subscribe()
    }

    pub fn subscribe_local_descriptions(&mut self) -> Subscription<RTCSessionDescription> {
        self.descriptions.subscribe()
    }

    pub fn subscribe_events(&mut self) -> Subscription<RTCSessionEvent> {
        self.events.subscribe()
    }

    /// Ends every subscription of this session.
    pub fn close(&mut self) {
        trace!("session {}: closing event bus", self.session_id);
        self.candidates.close();
        self.descriptions.close();
        self.events.close();
    }
}

/// Starts the task that feeds engine events to `handler` until shutdown.
pub(crate) fn spawn_dispatcher(
    runtime: &Handle,
    session_id: SessionId,
    mut inbox: mpsc::UnboundedReceiver<BusMessage>,
    handler: Arc<dyn EngineEventHandler>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        trace!("session {session_id}: dispatcher started");
        while let Some(msg) = inbox.recv().await {
            match msg {
                BusMessage::Engine(event) => handler.handle_engine_event(event),
                BusMessage::Shutdown => break,
            }
        }
        trace!("session {session_id}: dispatcher stopped");
    })
}
