/// Options handed to the engine when it creates an answer.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub struct RTCAnswerOptions {
    /// Whether the engine should enable voice activity detection.
    ///
    /// **Default:** `false`
    pub voice_activity_detection: bool,
}

/// Options handed to the engine when it creates an offer.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct RTCOfferOptions {
    /// Ask the remote peer to send audio.
    ///
    /// **Default:** `true`
    pub offer_to_receive_audio: bool,

    /// Ask the remote peer to send video.
    ///
    /// **Default:** `true`
    pub offer_to_receive_video: bool,

    /// Force ICE restart with new credentials.
    ///
    /// **Default:** `false`
    pub ice_restart: bool,
}

impl Default for RTCOfferOptions {
    fn default() -> Self {
        Self {
            offer_to_receive_audio: true,
            offer_to_receive_video: true,
            ice_restart: false,
        }
    }
}
