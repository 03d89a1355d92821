use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ScenecastError, ScenecastResult};

/// One RGBA8 frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Byte length expected for a `width` x `height` RGBA8 frame.
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ScenecastResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ScenecastResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> ScenecastResult<()>;
}

/// Sink that keeps frames in memory, for previews and tests.
///
/// Enforces the same contract as the encoding sinks: `begin` first, strictly increasing indices,
/// frames matching the configured size.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    finished: bool,
}

impl InMemorySink {
    /// Empty sink; call [`FrameSink::begin`] before pushing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured by `begin`.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Frames pushed since the last `begin`.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// `true` once `end` was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenecastResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ScenecastError::validation("sink dimensions must be non-zero"));
        }
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ScenecastResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ScenecastError::validation("in-memory sink not started"))?;
        if self.finished {
            return Err(ScenecastError::validation("in-memory sink already ended"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx.0 <= last.0
        {
            return Err(ScenecastError::validation(format!(
                "frame {} pushed after frame {}",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width
            || frame.height != cfg.height
            || frame.data.len() != FrameRGBA::expected_len(cfg.width, cfg.height)
        {
            return Err(ScenecastError::validation(format!(
                "frame size mismatch: got {}x{} ({} bytes), expected {}x{}",
                frame.width,
                frame.height,
                frame.data.len(),
                cfg.width,
                cfg.height
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ScenecastResult<()> {
        if self.cfg.is_none() {
            return Err(ScenecastError::validation("in-memory sink not started"));
        }
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
