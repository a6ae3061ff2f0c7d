#![warn(rust_2018_idioms)]
#![allow(dead_code)]

//! Offer/answer negotiation core for peer-to-peer media sessions.
//!
//! `rtc-negotiation` sequences session descriptions and ICE candidates
//! between an application, its signaling transport and a media engine that
//! does the actual work. It decides *when* the engine may create or apply a
//! description, buffers remote candidates that arrive too early, and fans
//! local candidates and descriptions out to subscribers.
//!
//! The media engine is abstracted behind [`engine::MediaEngine`]; the
//! signaling transport only sees [`signal::RTCSignalMessage`] records.
//!
//! # Negotiation
//!
//! ```text
//! Caller: New -create_offer-> HaveLocalOffer -remote answer-> Stable
//! Callee: New -remote offer-> HaveRemoteOffer -create_answer-> Stable
//! ```
//!
//! A remote offer received while acting as caller is rejected as glare.
//! Closing a session, or a fatal engine failure, is terminal.
//!
//! # Example
//!
//! ```ignore
//! use rtc_negotiation::configuration::{RTCConfigurationBuilder, RTCIceServer};
//! use rtc_negotiation::session::RTCSession;
//! use rtc_negotiation::signal::RTCSignalMessage;
//!
//! let config = RTCConfigurationBuilder::new()
//!     .with_ice_servers(vec![RTCIceServer {
//!         urls: vec!["stun:stun.l.google.com:19302".to_owned()],
//!         ..Default::default()
//!     }])
//!     .build();
//! let session = RTCSession::new(config, &engine_factory)?;
//!
//! let mut candidates = session.subscribe_local_candidates();
//! let offer = session.create_offer()?.await?;
//! transport.send(RTCSignalMessage::from(offer).marshal()?).await?;
//!
//! while let Some(candidate) = candidates.recv().await {
//!     transport.send(RTCSignalMessage::from(candidate).marshal()?).await?;
//! }
//! ```

pub use shared;

pub mod candidate;
pub mod configuration;
pub mod engine;
pub mod event;
pub mod negotiator;
pub mod sdp;
pub mod session;
pub mod signal;
pub mod state;
