use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::candidate::{CandidateBuffer, CandidateDisposition, RTCIceCandidate};
use crate::configuration::RTCConfiguration;
use crate::engine::{EngineEvent, EngineEventSink, MediaEngine, MediaEngineFactory};
use crate::event::{
    BusMessage, EngineEventHandler, EventBus, RTCSessionEvent, Subscription, spawn_dispatcher,
};
use crate::negotiator::{DescriptionNegotiator, NegotiationContext, PendingOperation};
use crate::sdp::RTCSessionDescription;
use crate::state::{RTCConnectionState, RTCNegotiationRole};
use shared::error::{Error, Result};

/// Identifies a session in logs and to its engine.
pub type SessionId = u64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

struct SessionState {
    negotiator: DescriptionNegotiator,
    candidates: CandidateBuffer,
    bus: EventBus,
    /// `None` once the session was closed and the engine released.
    engine: Option<Box<dyn MediaEngine>>,
}

struct SessionInner {
    id: SessionId,
    state: Mutex<SessionState>,
    inbox: mpsc::UnboundedSender<BusMessage>,
}

impl SessionInner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // every critical section leaves the state consistent, so a panic in
        // another holder does not invalidate it
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs one negotiation step with the engine and collaborators borrowed
    /// from the locked state.
    fn with_context<R>(
        &self,
        f: impl FnOnce(&mut DescriptionNegotiator, &mut NegotiationContext<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.lock();
        let SessionState {
            negotiator,
            candidates,
            bus,
            engine,
        } = &mut *guard;
        negotiator.ensure_active()?;
        let engine = engine.as_deref().ok_or(Error::ErrSessionClosed)?;
        let mut ctx = NegotiationContext {
            engine,
            candidates,
            bus,
        };
        f(negotiator, &mut ctx)
    }
}

impl EngineEventHandler for SessionInner {
    fn handle_engine_event(&self, event: EngineEvent) {
        let mut guard = self.lock();
        let SessionState {
            negotiator,
            candidates,
            bus,
            engine,
        } = &mut *guard;
        let Some(engine) = engine.as_deref() else {
            warn!(
                "session {}: discarding engine event after close: {:?}",
                self.id, event
            );
            return;
        };
        trace!("session {}: handling {:?}", self.id, event);
        let mut ctx = NegotiationContext {
            engine,
            candidates,
            bus,
        };
        negotiator.handle_engine_event(event, &mut ctx);
    }
}

/// One peer-to-peer negotiation session and the single entry point for the
/// application.
///
/// The session owns its engine from construction until [`close`] (or drop).
/// All state lives behind one lock per session; engine completions are fed
/// in by a dispatcher task spawned on the current tokio runtime, so distinct
/// sessions make progress independently.
///
/// Operations that need the engine return a [`PendingOperation`] right away;
/// ordering violations are reported before anything is sent to the engine.
///
/// ```ignore
/// let session = RTCSession::new(config, &factory)?;
/// let mut candidates = session.subscribe_local_candidates();
///
/// let offer = session.create_offer()?.await?;
/// signaling.send(RTCSignalMessage::Description(offer).marshal()?);
/// ```
///
/// [`close`]: RTCSession::close
pub struct RTCSession {
    inner: Arc<SessionInner>,
}

impl RTCSession {
    /// Validates `config`, acquires an engine from `factory` and starts the
    /// session's event dispatcher. Must be called within a tokio runtime.
    pub fn new<F: MediaEngineFactory>(config: RTCConfiguration, factory: &F) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| Error::ErrNoRuntime)?;

        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let engine = factory.create_engine(&config, EngineEventSink::new(id, inbox.clone()))?;

        let state = SessionState {
            negotiator: DescriptionNegotiator::new(
                id,
                *config.offer_options(),
                *config.answer_options(),
            ),
            candidates: CandidateBuffer::new(id),
            bus: EventBus::new(id, config.candidate_replay(), config.description_replay()),
            engine: Some(Box::new(engine)),
        };
        let inner = Arc::new(SessionInner {
            id,
            state: Mutex::new(state),
            inbox,
        });
        spawn_dispatcher(&runtime, id, inbox_rx, inner.clone());

        debug!("session {id}: created");
        Ok(Self { inner })
    }

    pub fn session_id(&self) -> SessionId {
        self.inner.id
    }

    pub fn connection_state(&self) -> RTCConnectionState {
        self.inner.lock().negotiator.connection_state()
    }

    pub fn role(&self) -> Option<RTCNegotiationRole> {
        self.inner.lock().negotiator.role()
    }

    pub fn local_description(&self) -> Option<RTCSessionDescription> {
        self.inner.lock().negotiator.local_description().cloned()
    }

    pub fn remote_description(&self) -> Option<RTCSessionDescription> {
        self.inner.lock().negotiator.remote_description().cloned()
    }

    /// Number of remote candidates waiting for both descriptions.
    pub fn pending_remote_candidates(&self) -> usize {
        self.inner.lock().candidates.pending()
    }

    /// Starts negotiation as the caller. The returned operation resolves with
    /// the offer once the engine has applied it locally; send it to the
    /// remote peer.
    pub fn create_offer(&self) -> Result<PendingOperation<RTCSessionDescription>> {
        self.inner.with_context(|n, ctx| n.create_offer(ctx))
    }

    /// Answers the applied remote offer. The returned operation resolves with
    /// the answer once the engine has applied it locally.
    pub fn create_answer(&self) -> Result<PendingOperation<RTCSessionDescription>> {
        self.inner.with_context(|n, ctx| n.create_answer(ctx))
    }

    /// Applies a description received from the remote peer. A description
    /// that conflicts with the role or state fails here with
    /// `ErrRejectedDescription`.
    pub fn set_remote_description(
        &self,
        description: RTCSessionDescription,
    ) -> Result<PendingOperation<()>> {
        self.inner
            .with_context(|n, ctx| n.set_remote_description(description, ctx))
    }

    /// Hands a candidate received from the remote peer to the session.
    ///
    /// Candidates received before both descriptions are set are queued and
    /// applied in arrival order later. A candidate received twice is reported
    /// as `Duplicate` and applied only once. A candidate the engine refuses
    /// fails with a transient `ErrNegotiationFailed` and may be sent again.
    pub fn add_remote_candidate(&self, candidate: RTCIceCandidate) -> Result<CandidateDisposition> {
        let result = self.inner.with_context(|_, ctx| {
            ctx.candidates
                .on_remote_candidate_received(candidate, ctx.engine)
        });
        match result {
            Err(Error::ErrDuplicateCandidate) => Ok(CandidateDisposition::Duplicate),
            other => other,
        }
    }

    /// Candidates gathered by the local engine, to be sent to the remote
    /// peer.
    pub fn subscribe_local_candidates(&self) -> Subscription<RTCIceCandidate> {
        self.inner.lock().bus.subscribe_local_candidates()
    }

    /// Local descriptions once applied, to be sent to the remote peer.
    pub fn subscribe_local_descriptions(&self) -> Subscription<RTCSessionDescription> {
        self.inner.lock().bus.subscribe_local_descriptions()
    }

    /// Every notification of this session, in order.
    pub fn subscribe_events(&self) -> Subscription<RTCSessionEvent> {
        self.inner.lock().bus.subscribe_events()
    }

    /// Closes the session and releases the engine.
    ///
    /// Pending operations resolve with `ErrSessionClosed`, subscriptions end
    /// and later engine callbacks are discarded. Closing again is a no-op.
    pub fn close(&self) {
        let engine = {
            let mut guard = self.inner.lock();
            let SessionState {
                negotiator,
                candidates,
                bus,
                engine,
            } = &mut *guard;
            let Some(engine) = engine.take() else {
                return;
            };

            negotiator.close(bus);
            candidates.clear();
            bus.close();
            engine
        };

        trace!("session {}: engine close", self.inner.id);
        engine.close();
        drop(engine);

        // the dispatcher may already be gone with its runtime
        let _ = self.inner.inbox.send(BusMessage::Shutdown);
        debug!("session {}: closed", self.inner.id);
    }
}

impl Drop for RTCSession {
    fn drop(&mut self) {
        self.close();
    }
}
