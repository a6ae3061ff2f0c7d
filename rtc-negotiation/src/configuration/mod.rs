pub mod ice_server;
pub mod offer_answer_options;
pub mod replay_policy;

pub use ice_server::RTCIceServer;
pub use offer_answer_options::{RTCAnswerOptions, RTCOfferOptions};
pub use replay_policy::ReplayPolicy;

use shared::error::Result;

/// A Configuration defines how a session is negotiated. It is handed to the
/// engine factory when the session acquires its peer connection, and is never
/// shared between sessions through global state.
#[derive(Debug, Clone)]
pub struct RTCConfiguration {
    /// ice_servers defines a slice describing servers available to be used by
    /// ICE, such as STUN and TURN servers.
    pub(crate) ice_servers: Vec<RTCIceServer>,

    pub(crate) offer_options: RTCOfferOptions,

    pub(crate) answer_options: RTCAnswerOptions,

    /// Replay applied to late subscribers of local candidates.
    pub(crate) candidate_replay: ReplayPolicy,

    /// Replay applied to late subscribers of local descriptions.
    pub(crate) description_replay: ReplayPolicy,
}

impl Default for RTCConfiguration {
    fn default() -> Self {
        RTCConfigurationBuilder::new().build()
    }
}

impl RTCConfiguration {
    /// The STUN and TURN servers the engine factory should hand to its peer
    /// connection, exactly as validated.
    pub fn ice_servers(&self) -> &[RTCIceServer] {
        &self.ice_servers
    }

    pub fn offer_options(&self) -> &RTCOfferOptions {
        &self.offer_options
    }

    pub fn answer_options(&self) -> &RTCAnswerOptions {
        &self.answer_options
    }

    pub fn candidate_replay(&self) -> ReplayPolicy {
        self.candidate_replay
    }

    pub fn description_replay(&self) -> ReplayPolicy {
        self.description_replay
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for ice_server in &self.ice_servers {
            ice_server.validate()?;
        }
        Ok(())
    }
}

pub struct RTCConfigurationBuilder {
    pub(crate) ice_servers: Vec<RTCIceServer>,

    pub(crate) offer_options: RTCOfferOptions,

    pub(crate) answer_options: RTCAnswerOptions,

    pub(crate) candidate_replay: ReplayPolicy,

    pub(crate) description_replay: ReplayPolicy,
}

impl Default for RTCConfigurationBuilder {
    fn default() -> Self {
        Self {
            ice_servers: vec![],
            offer_options: RTCOfferOptions::default(),
            answer_options: RTCAnswerOptions::default(),
            candidate_replay: ReplayPolicy::All,
            description_replay: ReplayPolicy::None,
        }
    }
}

impl RTCConfigurationBuilder {
    pub fn new() -> Self {
        RTCConfigurationBuilder::default()
    }

    pub fn with_ice_servers(mut self, ice_servers: Vec<RTCIceServer>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_offer_options(mut self, offer_options: RTCOfferOptions) -> Self {
        self.offer_options = offer_options;
        self
    }

    pub fn with_answer_options(mut self, answer_options: RTCAnswerOptions) -> Self {
        self.answer_options = answer_options;
        self
    }

    pub fn with_candidate_replay(mut self, candidate_replay: ReplayPolicy) -> Self {
        self.candidate_replay = candidate_replay;
        self
    }

    pub fn with_description_replay(mut self, description_replay: ReplayPolicy) -> Self {
        self.description_replay = description_replay;
        self
    }

    pub fn build(self) -> RTCConfiguration {
        RTCConfiguration {
            ice_servers: self.ice_servers,
            offer_options: self.offer_options,
            answer_options: self.answer_options,
            candidate_replay: self.candidate_replay,
            description_replay: self.description_replay,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use shared::error::Error;

    #[test]
    fn test_configuration_ice_servers_kept_verbatim() {
        let tests = vec![
            "stun:stun.l.google.com:19302",
            // queries are passed through; the engine decides what to make of them
            "stun:global.stun.twilio.com:3478?transport=udp",
        ];

        for url in tests {
            let cfg = RTCConfigurationBuilder::new()
                .with_ice_servers(vec![RTCIceServer {
                    urls: vec![url.to_owned()],
                    ..Default::default()
                }])
                .build();

            assert_eq!(cfg.validate(), Ok(()), "{url}");
            assert_eq!(cfg.ice_servers()[0].urls, vec![url.to_owned()]);
        }
    }

    #[test]
    fn test_configuration_defaults() {
        let cfg = RTCConfigurationBuilder::new().build();

        assert!(cfg.ice_servers().is_empty());
        assert!(cfg.offer_options().offer_to_receive_audio);
        assert!(cfg.offer_options().offer_to_receive_video);
        assert!(!cfg.offer_options().ice_restart);
        assert_eq!(cfg.candidate_replay(), ReplayPolicy::All);
        assert_eq!(cfg.description_replay(), ReplayPolicy::None);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_configuration_validate() {
        let cfg = RTCConfigurationBuilder::new()
            .with_ice_servers(vec![
                RTCIceServer {
                    urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                    ..Default::default()
                },
                RTCIceServer {
                    urls: vec!["turn:turn.example.org:3478".to_owned()],
                    ..Default::default()
                },
            ])
            .build();

        assert_eq!(cfg.validate(), Err(Error::ErrNoTurnCredentials));
    }
}
