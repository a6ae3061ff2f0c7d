mod common;

use common::{EngineProbe, OFFER_SDP, host_candidate, init_log};
use rtc_negotiation::candidate::CandidateDisposition;
use rtc_negotiation::engine::EngineEvent;
use rtc_negotiation::sdp::{RTCSdpType, RTCSessionDescription};
use rtc_negotiation::signal::RTCSignalMessage;
use rtc_negotiation::state::RTCConnectionState;

#[test]
fn test_offer_round_trips_byte_identical() -> anyhow::Result<()> {
    let offer = RTCSessionDescription::offer(OFFER_SDP.to_owned());

    let raw = RTCSignalMessage::from(offer.clone()).marshal()?;
    let RTCSignalMessage::Description(received) = RTCSignalMessage::unmarshal(&raw)? else {
        anyhow::bail!("expected a description in {raw}");
    };

    assert_eq!(received.sdp_type(), RTCSdpType::Offer);
    assert_eq!(received.sdp().as_bytes(), OFFER_SDP.as_bytes());
    assert_eq!(received, offer);

    Ok(())
}

/// Two sessions negotiate with each other through serialized signal
/// messages only.
#[tokio::test]
async fn test_two_sessions_negotiate_over_signaling() -> anyhow::Result<()> {
    init_log();
    let caller_probe = EngineProbe::auto();
    let callee_probe = EngineProbe::auto();
    let caller = caller_probe.session();
    let callee = callee_probe.session();
    let mut caller_candidates = caller.subscribe_local_candidates();

    // the caller gathers a candidate before the callee knows about it
    let gathered = host_candidate(7).with_url("stun:stun.l.google.com:19302".to_owned());
    caller_probe.emit(EngineEvent::LocalCandidate(gathered.clone()));

    let offer = caller.create_offer()?.await?;
    let wire = RTCSignalMessage::from(offer).marshal()?;

    let RTCSignalMessage::Description(offer) = RTCSignalMessage::unmarshal(&wire)? else {
        anyhow::bail!("expected offer");
    };
    callee.set_remote_description(offer)?.await?;

    let candidate = caller_candidates
        .recv()
        .await
        .ok_or_else(|| anyhow::anyhow!("caller candidate stream ended"))?;
    let wire = RTCSignalMessage::from(candidate).marshal()?;
    let RTCSignalMessage::Candidate(candidate) = RTCSignalMessage::unmarshal(&wire)? else {
        anyhow::bail!("expected candidate");
    };
    assert_eq!(
        callee.add_remote_candidate(candidate)?,
        CandidateDisposition::Queued
    );

    let answer = callee.create_answer()?.await?;
    let wire = RTCSignalMessage::from(answer).marshal()?;
    let RTCSignalMessage::Description(answer) = RTCSignalMessage::unmarshal(&wire)? else {
        anyhow::bail!("expected answer");
    };
    caller.set_remote_description(answer)?.await?;

    assert_eq!(caller.connection_state(), RTCConnectionState::Stable);
    assert_eq!(callee.connection_state(), RTCConnectionState::Stable);
    assert_eq!(callee_probe.applied_candidates(), vec![gathered]);

    Ok(())
}
