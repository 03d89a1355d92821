use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Absolute 0-based frame index in master timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)` in timeline space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> ScenecastResult<Self> {
        if start.0 > end.0 {
            return Err(ScenecastError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Create a range from inclusive first/last frame indices.
    pub fn from_inclusive(first: u64, last: u64) -> ScenecastResult<Self> {
        if first > last {
            return Err(ScenecastError::validation(
                "first frame must be <= last frame",
            ));
        }
        let end = last.checked_add(1).ok_or_else(|| {
            ScenecastError::validation(format!("last frame {last} is out of range"))
        })?;
        Self::new(FrameIndex(first), FrameIndex(end))
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Last frame contained in the range, if any.
    pub fn last(self) -> Option<FrameIndex> {
        (!self.is_empty()).then(|| FrameIndex(self.end.0 - 1))
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ScenecastResult<Self> {
        if den == 0 {
            return Err(ScenecastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScenecastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate.
    pub fn whole(num: u32) -> ScenecastResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

/// How the host loop is currently driving the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackMode {
    /// Stopped; the user may be scrubbing.
    Paused,
    /// Realtime preview playback.
    Playing,
    /// Interactive presentation (realtime, slide-driven).
    Presenting,
    /// Deterministic frame-stepped export.
    Rendering,
}

impl PlaybackMode {
    /// `true` for realtime modes where the native clock runs freely.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Playing | Self::Presenting)
    }

    /// `true` when frames are being produced for export.
    pub fn is_rendering(self) -> bool {
        matches!(self, Self::Rendering)
    }
}

/// Kind of media behind a scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Video element (may or may not carry an audio stream).
    Video,
    /// Audio-only element.
    Audio,
}

/// Per-draw information supplied by the host loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Virtual timeline time in seconds.
    pub time: f64,
    /// Current playback mode.
    pub mode: PlaybackMode,
    /// Scene frame rate.
    pub fps: Fps,
    /// Monotonic draw counter; one value per host tick.
    pub tick: u64,
}

impl FrameContext {
    /// Context for rendering frame `frame` of an export.
    pub fn rendering(frame: FrameIndex, fps: Fps) -> Self {
        Self {
            time: fps.frames_to_secs(frame.0),
            mode: PlaybackMode::Rendering,
            fps,
            tick: frame.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
