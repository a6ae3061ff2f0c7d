//! Offer/answer sequencing for one session.
//!
//! [`DescriptionNegotiator`] validates every description operation against
//! the connection state and the negotiation role, asks the engine to carry it
//! out and completes the caller's [`PendingOperation`] once the engine
//! reports back. It never waits: each step either fails synchronously or
//! registers the operation and returns.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use log::{debug, error, trace, warn};
use tokio::sync::oneshot;

use crate::candidate::CandidateBuffer;
use crate::configuration::{RTCAnswerOptions, RTCOfferOptions};
use crate::engine::{EngineEvent, EngineFailure, MediaEngine, OperationId};
use crate::event::EventBus;
use crate::sdp::{RTCSdpType, RTCSessionDescription};
use crate::session::SessionId;
use crate::state::{ConnectionStateTracker, RTCConnectionState, RTCNegotiationRole, StateChangeOp};
use shared::error::{Error, RejectReason, Result};

/// The collaborators a negotiation step may touch. All of them are owned by
/// the session and borrowed for the duration of one locked step.
pub struct NegotiationContext<'a> {
    pub engine: &'a dyn MediaEngine,
    pub candidates: &'a mut CandidateBuffer,
    pub bus: &'a mut EventBus,
}

/// Resolves when the engine has finished the operation.
///
/// Dropping it does not cancel the operation; the session still applies the
/// result when the engine reports back.
#[derive(Debug)]
pub struct PendingOperation<T> {
    op: OperationId,
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> PendingOperation<T> {
    fn new(op: OperationId, rx: oneshot::Receiver<Result<T>>) -> Self {
        Self { op, rx }
    }

    pub fn operation_id(&self) -> OperationId {
        self.op
    }
}

impl<T> Future for PendingOperation<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // the session went away without answering
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ErrSessionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug)]
enum LocalStage {
    Creating,
    Applying(RTCSessionDescription),
}

#[derive(Debug)]
struct LocalOperation {
    op: OperationId,
    sdp_type: RTCSdpType,
    stage: LocalStage,
    assigned_role: bool,
    tx: oneshot::Sender<Result<RTCSessionDescription>>,
}

#[derive(Debug)]
struct RemoteOperation {
    op: OperationId,
    description: RTCSessionDescription,
    assigned_role: bool,
    tx: oneshot::Sender<Result<()>>,
}

/// Drives the offer/answer exchange of one session.
///
/// At most one local operation (create offer or answer) and one remote
/// operation (apply remote description) are in flight at a time.
#[derive(Debug)]
pub struct DescriptionNegotiator {
    session_id: SessionId,
    tracker: ConnectionStateTracker,
    role: Option<RTCNegotiationRole>,
    local_description: Option<RTCSessionDescription>,
    remote_description: Option<RTCSessionDescription>,
    offer_options: RTCOfferOptions,
    answer_options: RTCAnswerOptions,
    local_op: Option<LocalOperation>,
    remote_op: Option<RemoteOperation>,
    next_op: OperationId,
}

impl DescriptionNegotiator {
    pub fn new(
        session_id: SessionId,
        offer_options: RTCOfferOptions,
        answer_options: RTCAnswerOptions,
    ) -> Self {
        Self {
            session_id,
            tracker: ConnectionStateTracker::new(),
            role: None,
            local_description: None,
            remote_description: None,
            offer_options,
            answer_options,
            local_op: None,
            remote_op: None,
            next_op: 0,
        }
    }

    pub fn connection_state(&self) -> RTCConnectionState {
        self.tracker.current_state()
    }

    pub fn role(&self) -> Option<RTCNegotiationRole> {
        self.role
    }

    pub fn local_description(&self) -> Option<&RTCSessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&RTCSessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn ensure_active(&self) -> Result<()> {
        self.tracker.ensure_active()
    }

    /// Asks the engine for an offer and applies it as the local description.
    pub fn create_offer(
        &mut self,
        ctx: &mut NegotiationContext<'_>,
    ) -> Result<PendingOperation<RTCSessionDescription>> {
        self.start_local(RTCSdpType::Offer, ctx)
    }

    /// Asks the engine for an answer to the applied remote offer and applies
    /// it as the local description.
    pub fn create_answer(
        &mut self,
        ctx: &mut NegotiationContext<'_>,
    ) -> Result<PendingOperation<RTCSessionDescription>> {
        self.start_local(RTCSdpType::Answer, ctx)
    }

    /// Validates `description` against the role and state, then hands it to
    /// the engine.
    pub fn set_remote_description(
        &mut self,
        description: RTCSessionDescription,
        ctx: &mut NegotiationContext<'_>,
    ) -> Result<PendingOperation<()>> {
        self.tracker.ensure_active()?;

        match description.sdp_type() {
            RTCSdpType::Offer => {
                if self.role == Some(RTCNegotiationRole::Caller) {
                    warn!(
                        "session {}: remote offer while acting as caller",
                        self.session_id
                    );
                    return Err(Error::ErrRejectedDescription(RejectReason::Glare));
                }
                if self.remote_op.is_some() {
                    return Err(Error::ErrOperationInProgress(
                        "set remote description".to_owned(),
                    ));
                }
                if self.tracker.check(StateChangeOp::SetRemoteOffer).is_err() {
                    return Err(Error::ErrRejectedDescription(
                        RejectReason::UnexpectedOffer,
                    ));
                }
            }
            RTCSdpType::Answer => {
                if self.remote_op.is_some() {
                    return Err(Error::ErrOperationInProgress(
                        "set remote description".to_owned(),
                    ));
                }
                if self.role != Some(RTCNegotiationRole::Caller)
                    || self.tracker.check(StateChangeOp::SetRemoteAnswer).is_err()
                {
                    return Err(Error::ErrRejectedDescription(
                        RejectReason::UnexpectedAnswer,
                    ));
                }
            }
            RTCSdpType::Unspecified => {
                return Err(Error::ErrRejectedDescription(
                    RejectReason::UnspecifiedType,
                ));
            }
        }

        let assigned_role = self.role.is_none();
        if assigned_role {
            self.role = Some(RTCNegotiationRole::Callee);
        }

        let op = self.next_operation_id();
        let (tx, rx) = oneshot::channel();
        debug!(
            "session {}: applying remote {} (op {})",
            self.session_id,
            description.sdp_type(),
            op
        );
        trace!("session {}: engine set_remote_description op {}", self.session_id, op);
        let dispatched = ctx.engine.set_remote_description(op, &description);
        self.remote_op = Some(RemoteOperation {
            op,
            description,
            assigned_role,
            tx,
        });
        if let Err(err) = dispatched {
            self.on_description_failed(op, err.into(), ctx);
        }

        Ok(PendingOperation::new(op, rx))
    }

    /// Feeds one engine event into the negotiation.
    pub fn handle_engine_event(&mut self, event: EngineEvent, ctx: &mut NegotiationContext<'_>) {
        match event {
            EngineEvent::DescriptionCreated { op, description } => {
                self.on_description_created(op, description, ctx)
            }
            EngineEvent::DescriptionApplied { op } => self.on_description_applied(op, ctx),
            EngineEvent::DescriptionFailed { op, failure } => {
                self.on_description_failed(op, failure, ctx)
            }
            EngineEvent::LocalCandidate(candidate) => {
                ctx.candidates.on_local_candidate_discovered(candidate, ctx.bus)
            }
            EngineEvent::ConnectionFailed(failure) => {
                ctx.bus
                    .publish_negotiation_failed(failure.severity, failure.reason.clone());
                if failure.is_fatal() {
                    self.fail(&failure, ctx);
                } else {
                    warn!(
                        "session {}: engine reported {}",
                        self.session_id,
                        Error::from(failure)
                    );
                }
            }
        }
    }

    /// Moves to closed and resolves whatever is still pending. A failed
    /// session stays failed.
    pub fn close(&mut self, bus: &mut EventBus) {
        if let Ok(state) = self.tracker.transition(StateChangeOp::Close) {
            debug!("session {}: connection state -> {}", self.session_id, state);
            bus.publish_state_change(state);
        }
        self.abort_pending(Error::ErrSessionClosed);
    }

    fn next_operation_id(&mut self) -> OperationId {
        self.next_op += 1;
        self.next_op
    }

    fn start_local(
        &mut self,
        sdp_type: RTCSdpType,
        ctx: &mut NegotiationContext<'_>,
    ) -> Result<PendingOperation<RTCSessionDescription>> {
        self.tracker.ensure_active()?;

        let (role, state_op) = if sdp_type == RTCSdpType::Offer {
            (RTCNegotiationRole::Caller, StateChangeOp::SetLocalOffer)
        } else {
            (RTCNegotiationRole::Callee, StateChangeOp::SetLocalAnswer)
        };

        if let Some(current) = self.role {
            if current != role {
                return Err(Error::ErrInvalidTransition(format!(
                    "cannot create {sdp_type} as {current}"
                )));
            }
        }
        if self.local_op.is_some() {
            return Err(Error::ErrOperationInProgress(format!("create {sdp_type}")));
        }
        self.tracker.check(state_op)?;

        let assigned_role = self.role.is_none();
        self.role = Some(role);

        let op = self.next_operation_id();
        let (tx, rx) = oneshot::channel();
        self.local_op = Some(LocalOperation {
            op,
            sdp_type,
            stage: LocalStage::Creating,
            assigned_role,
            tx,
        });

        debug!(
            "session {}: creating local {} as {} (op {})",
            self.session_id, sdp_type, role, op
        );
        let dispatched = if sdp_type == RTCSdpType::Offer {
            trace!("session {}: engine create_offer op {}", self.session_id, op);
            ctx.engine.create_offer(op, &self.offer_options)
        } else {
            trace!("session {}: engine create_answer op {}", self.session_id, op);
            ctx.engine.create_answer(op, &self.answer_options)
        };
        if let Err(err) = dispatched {
            self.on_description_failed(op, err.into(), ctx);
        }

        Ok(PendingOperation::new(op, rx))
    }

    fn on_description_created(
        &mut self,
        op: OperationId,
        description: RTCSessionDescription,
        ctx: &mut NegotiationContext<'_>,
    ) {
        let expected = match &self.local_op {
            Some(local) if local.op == op && matches!(local.stage, LocalStage::Creating) => {
                local.sdp_type
            }
            _ => {
                warn!(
                    "session {}: discarding created description for unknown op {}",
                    self.session_id, op
                );
                return;
            }
        };

        if description.sdp_type() != expected {
            let failure = EngineFailure::transient(format!(
                "engine created {} for a {} request",
                description.sdp_type(),
                expected
            ));
            self.on_description_failed(op, failure, ctx);
            return;
        }

        trace!("session {}: engine set_local_description op {}", self.session_id, op);
        let dispatched = ctx.engine.set_local_description(op, &description);
        if let Some(local) = self.local_op.as_mut() {
            local.stage = LocalStage::Applying(description);
        }
        if let Err(err) = dispatched {
            self.on_description_failed(op, err.into(), ctx);
        }
    }

    fn on_description_applied(&mut self, op: OperationId, ctx: &mut NegotiationContext<'_>) {
        if let Some(local) = self
            .local_op
            .take_if(|l| l.op == op && matches!(l.stage, LocalStage::Applying(_)))
        {
            self.complete_local(local, ctx);
        } else if let Some(remote) = self.remote_op.take_if(|r| r.op == op) {
            self.complete_remote(remote, ctx);
        } else {
            warn!(
                "session {}: discarding completion for unknown op {}",
                self.session_id, op
            );
        }
    }

    fn complete_local(&mut self, local: LocalOperation, ctx: &mut NegotiationContext<'_>) {
        let LocalOperation {
            sdp_type, stage, tx, ..
        } = local;
        let LocalStage::Applying(description) = stage else {
            return;
        };

        let steps: &[StateChangeOp] = if sdp_type == RTCSdpType::Offer {
            &[StateChangeOp::SetLocalOffer]
        } else {
            &[StateChangeOp::SetLocalAnswer, StateChangeOp::Complete]
        };
        for step in steps {
            match self.tracker.transition(*step) {
                Ok(state) => {
                    debug!("session {}: connection state -> {}", self.session_id, state);
                    ctx.bus.publish_state_change(state);
                }
                Err(err) => {
                    error!(
                        "session {}: local {} applied but {}",
                        self.session_id, sdp_type, err
                    );
                    let _ = tx.send(Err(err));
                    return;
                }
            }
        }

        self.local_description = Some(description.clone());
        ctx.bus.publish_local_description(description.clone());
        self.maybe_flush(ctx);
        let _ = tx.send(Ok(description));
    }

    fn complete_remote(&mut self, remote: RemoteOperation, ctx: &mut NegotiationContext<'_>) {
        let RemoteOperation {
            description, tx, ..
        } = remote;

        let step = if description.sdp_type() == RTCSdpType::Offer {
            StateChangeOp::SetRemoteOffer
        } else {
            StateChangeOp::SetRemoteAnswer
        };
        match self.tracker.transition(step) {
            Ok(state) => {
                debug!("session {}: connection state -> {}", self.session_id, state);
                ctx.bus.publish_state_change(state);
            }
            Err(err) => {
                error!(
                    "session {}: remote {} applied but {}",
                    self.session_id,
                    description.sdp_type(),
                    err
                );
                let _ = tx.send(Err(err));
                return;
            }
        }

        self.remote_description = Some(description);
        self.maybe_flush(ctx);
        let _ = tx.send(Ok(()));
    }

    fn on_description_failed(
        &mut self,
        op: OperationId,
        failure: EngineFailure,
        ctx: &mut NegotiationContext<'_>,
    ) {
        if let Some(local) = self.local_op.take_if(|l| l.op == op) {
            self.abandon(local.assigned_role, &failure, ctx);
            let _ = local.tx.send(Err(failure.clone().into()));
        } else if let Some(remote) = self.remote_op.take_if(|r| r.op == op) {
            self.abandon(remote.assigned_role, &failure, ctx);
            let _ = remote.tx.send(Err(failure.clone().into()));
        } else {
            warn!(
                "session {}: discarding failure for unknown op {}: {}",
                self.session_id, op, failure.reason
            );
            return;
        }

        if failure.is_fatal() {
            self.fail(&failure, ctx);
        }
    }

    fn abandon(
        &mut self,
        assigned_role: bool,
        failure: &EngineFailure,
        ctx: &mut NegotiationContext<'_>,
    ) {
        if assigned_role {
            self.role = None;
        }
        if !failure.is_fatal() {
            warn!(
                "session {}: negotiation failed, state stays {}: {}",
                self.session_id,
                self.tracker.current_state(),
                failure.reason
            );
        }
        ctx.bus
            .publish_negotiation_failed(failure.severity, failure.reason.clone());
    }

    fn fail(&mut self, failure: &EngineFailure, ctx: &mut NegotiationContext<'_>) {
        let Ok(state) = self.tracker.transition(StateChangeOp::Fail) else {
            return;
        };
        error!(
            "session {}: fatal engine failure: {}",
            self.session_id, failure.reason
        );
        ctx.bus.publish_state_change(state);
        self.abort_pending(Error::ErrSessionFailed);
        ctx.candidates.clear();
    }

    fn abort_pending(&mut self, err: Error) {
        if let Some(local) = self.local_op.take() {
            debug!(
                "session {}: aborting local op {}: {}",
                self.session_id, local.op, err
            );
            let _ = local.tx.send(Err(clone_terminal(&err)));
        }
        if let Some(remote) = self.remote_op.take() {
            debug!(
                "session {}: aborting remote op {}: {}",
                self.session_id, remote.op, err
            );
            let _ = remote.tx.send(Err(err));
        }
    }

    fn maybe_flush(&mut self, ctx: &mut NegotiationContext<'_>) {
        if self.local_description.is_some()
            && self.remote_description.is_some()
            && !ctx.candidates.is_ready()
        {
            ctx.candidates.flush(ctx.engine);
        }
    }
}

fn clone_terminal(err: &Error) -> Error {
    match err {
        Error::ErrSessionFailed => Error::ErrSessionFailed,
        _ => Error::ErrSessionClosed,
    }
}
