use crate::encode::sink::FrameRGBA;
use crate::foundation::error::ScenecastResult;

/// Buffering level reported by a native media handle.
///
/// Ordered: a later variant always implies the earlier ones.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ReadyState {
    /// Nothing is known about the resource.
    HaveNothing,
    /// Duration and dimensions are known.
    HaveMetadata,
    /// Data for the current position is available.
    HaveCurrentData,
    /// Data beyond the current position is available.
    HaveFutureData,
    /// Enough data is buffered to play through.
    HaveEnoughData,
}

impl ReadyState {
    /// Map the numeric `readyState` convention (0..=4).
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::HaveNothing,
            1 => Self::HaveMetadata,
            2 => Self::HaveCurrentData,
            3 => Self::HaveFutureData,
            _ => Self::HaveEnoughData,
        }
    }
}

/// Classified native media failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaErrorCode {
    /// Fetching was aborted by the user agent.
    Aborted,
    /// A network error interrupted the fetch.
    Network,
    /// The resource could not be decoded.
    Decode,
    /// The resource or its format is not supported.
    SrcNotSupported,
    /// Any code outside the known set.
    Unknown(u16),
}

impl MediaErrorCode {
    /// Classify the numeric `MediaError.code` convention (1..=4).
    pub fn classify(code: u16) -> Self {
        match code {
            1 => Self::Aborted,
            2 => Self::Network,
            3 => Self::Decode,
            4 => Self::SrcNotSupported,
            other => Self::Unknown(other),
        }
    }

    /// Human readable description used in logs and errors.
    pub fn describe(self) -> String {
        match self {
            Self::Aborted => "media fetch aborted".to_string(),
            Self::Network => "network error while fetching media".to_string(),
            Self::Decode => "media decode error".to_string(),
            Self::SrcNotSupported => "media format not supported".to_string(),
            Self::Unknown(code) => format!("unknown media error (code {code})"),
        }
    }
}

/// Capability contract of a native media element (video or audio).
///
/// Handles are owned by the [`crate::AssetPool`]; scene nodes borrow them and only steer their
/// clock. Every method must be cheap and non-blocking: readiness and seek completion are
/// observed by polling [`MediaHandle::ready_state`] and [`MediaHandle::is_seeking`].
pub trait MediaHandle {
    /// Source locator currently loaded (empty while a placeholder).
    fn src(&self) -> &str;
    /// Point the handle at `src` and restart buffering.
    fn load(&mut self, src: &str);
    /// Current buffering level.
    fn ready_state(&self) -> ReadyState;
    /// Native playback position in seconds.
    fn current_time(&self) -> f64;
    /// Request a native seek. Completion is reported through `is_seeking`.
    fn set_current_time(&mut self, secs: f64);
    /// `true` while a native seek is in flight.
    fn is_seeking(&self) -> bool;
    /// Media duration in seconds, once metadata is known.
    fn duration(&self) -> Option<f64>;
    /// `true` when the native clock is not advancing.
    fn is_paused(&self) -> bool;
    /// Start native playback.
    fn play(&mut self) -> ScenecastResult<()>;
    /// Stop native playback.
    fn pause(&mut self);
    /// Native rate multiplier.
    fn set_playback_rate(&mut self, rate: f64);
    /// Native volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f64);
    /// Mute or unmute native output.
    fn set_muted(&mut self, muted: bool);
    /// Native looping flag.
    fn set_loop(&mut self, looping: bool);
    /// Pending native error, if any.
    fn error(&self) -> Option<MediaErrorCode>;

    /// Extra gain above unity, for handles routed through an amplification stage.
    ///
    /// Returns `false` when the handle cannot amplify.
    fn set_amplification(&mut self, _gain: f64) -> bool {
        false
    }

    /// Frame currently presented by a video handle.
    fn current_frame(&self) -> Option<FrameRGBA> {
        None
    }
}
