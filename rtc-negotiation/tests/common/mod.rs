#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rtc_negotiation::candidate::RTCIceCandidate;
use rtc_negotiation::configuration::{
    RTCAnswerOptions, RTCConfiguration, RTCConfigurationBuilder, RTCOfferOptions,
};
use rtc_negotiation::engine::{
    EngineEvent, EngineEventSink, EngineFailure, MediaEngine, MediaEngineFactory, OperationId,
};
use rtc_negotiation::sdp::RTCSessionDescription;
use rtc_negotiation::session::RTCSession;
use rtc_negotiation::shared::error::Result;

pub const OFFER_SDP: &str = "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\na=group:BUNDLE 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\n";
pub const ANSWER_SDP: &str = "v=0\r\no=- 7104235487291034772 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\na=group:BUNDLE 0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\n";

pub fn init_log() {
    env_logger::builder().is_test(true).try_init().ok();
}

pub fn host_candidate(n: u16) -> RTCIceCandidate {
    RTCIceCandidate::new(
        format!("candidate:{n} 1 udp 2122260223 192.168.1.{n} 5{n:04} typ host"),
        0,
        "0".to_owned(),
    )
}

/// Everything the session asked of the engine, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreateOffer(OperationId),
    CreateAnswer(OperationId),
    SetLocal(OperationId, RTCSessionDescription),
    SetRemote(OperationId, RTCSessionDescription),
    AddCandidate(RTCIceCandidate),
    Close,
}

#[derive(Debug, Default)]
struct ProbeState {
    calls: Vec<EngineCall>,
    sink: Option<EngineEventSink>,
    auto_complete: bool,
    next_failure: Option<EngineFailure>,
    reject_candidates: bool,
}

/// Test-side view of a scripted engine: inspects calls and drives
/// completions.
#[derive(Debug, Clone, Default)]
pub struct EngineProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl EngineProbe {
    /// An engine that completes every request right away.
    pub fn auto() -> Self {
        let probe = Self::default();
        probe.state.lock().unwrap().auto_complete = true;
        probe
    }

    /// An engine that completes nothing until the test emits events.
    pub fn manual() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> ScriptedFactory {
        ScriptedFactory {
            probe: self.clone(),
        }
    }

    pub fn session(&self) -> RTCSession {
        self.session_with(RTCConfigurationBuilder::new().build())
    }

    pub fn session_with(&self, config: RTCConfiguration) -> RTCSession {
        RTCSession::new(config, &self.factory()).unwrap()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn applied_candidates(&self) -> Vec<RTCIceCandidate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::AddCandidate(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == EngineCall::Close)
            .count()
    }

    /// The next description request fails with `failure`.
    pub fn fail_next(&self, failure: EngineFailure) {
        self.state.lock().unwrap().next_failure = Some(failure);
    }

    /// While set, the engine refuses every remote candidate.
    pub fn reject_candidates(&self, reject: bool) {
        self.state.lock().unwrap().reject_candidates = reject;
    }

    pub fn emit(&self, event: EngineEvent) -> bool {
        let sink = self.state.lock().unwrap().sink.clone();
        sink.map(|s| s.emit(event)).unwrap_or(false)
    }
}

pub struct ScriptedFactory {
    probe: EngineProbe,
}

impl MediaEngineFactory for ScriptedFactory {
    type Engine = ScriptedEngine;

    fn create_engine(
        &self,
        _config: &RTCConfiguration,
        sink: EngineEventSink,
    ) -> Result<ScriptedEngine> {
        self.probe.state.lock().unwrap().sink = Some(sink.clone());
        Ok(ScriptedEngine {
            probe: self.probe.clone(),
            sink,
        })
    }
}

pub struct ScriptedEngine {
    probe: EngineProbe,
    sink: EngineEventSink,
}

impl ScriptedEngine {
    fn record(&self, call: EngineCall) {
        self.probe.state.lock().unwrap().calls.push(call);
    }

    fn respond(&self, op: OperationId, created: Option<RTCSessionDescription>) {
        let (auto_complete, failure) = {
            let mut state = self.probe.state.lock().unwrap();
            (state.auto_complete, state.next_failure.take())
        };

        if let Some(failure) = failure {
            self.sink
                .emit(EngineEvent::DescriptionFailed { op, failure });
        } else if auto_complete {
            let event = match created {
                Some(description) => EngineEvent::DescriptionCreated { op, description },
                None => EngineEvent::DescriptionApplied { op },
            };
            self.sink.emit(event);
        }
    }
}

impl MediaEngine for ScriptedEngine {
    fn create_offer(&self, op: OperationId, _options: &RTCOfferOptions) -> Result<()> {
        self.record(EngineCall::CreateOffer(op));
        self.respond(op, Some(RTCSessionDescription::offer(OFFER_SDP.to_owned())));
        Ok(())
    }

    fn create_answer(&self, op: OperationId, _options: &RTCAnswerOptions) -> Result<()> {
        self.record(EngineCall::CreateAnswer(op));
        self.respond(op, Some(RTCSessionDescription::answer(ANSWER_SDP.to_owned())));
        Ok(())
    }

    fn set_local_description(
        &self,
        op: OperationId,
        description: &RTCSessionDescription,
    ) -> Result<()> {
        self.record(EngineCall::SetLocal(op, description.clone()));
        self.respond(op, None);
        Ok(())
    }

    fn set_remote_description(
        &self,
        op: OperationId,
        description: &RTCSessionDescription,
    ) -> Result<()> {
        self.record(EngineCall::SetRemote(op, description.clone()));
        self.respond(op, None);
        Ok(())
    }

    fn add_ice_candidate(&self, candidate: &RTCIceCandidate) -> Result<()> {
        if self.probe.state.lock().unwrap().reject_candidates {
            return Err(EngineFailure::transient("candidate refused").into());
        }
        self.record(EngineCall::AddCandidate(candidate.clone()));
        Ok(())
    }

    fn close(&self) {
        self.record(EngineCall::Close);
    }
}
