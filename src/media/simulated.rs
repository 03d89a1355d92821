use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::encode::sink::FrameRGBA;
use crate::foundation::core::MediaKind;
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::media::clock::Clock;
use crate::media::handle::{MediaErrorCode, MediaHandle, ReadyState};
use crate::media::pool::HandleFactory;

/// Headless media handle whose buffering, seeking and clock follow a [`Clock`].
///
/// Useful for tests and for driving scenes without a native media stack. With a
/// [`crate::ManualClock`] every observable is deterministic.
pub struct SimulatedHandle {
    src: String,
    kind: MediaKind,
    clock: Rc<dyn Clock>,
    duration: f64,
    ready_at: Duration,
    load_latency: Duration,
    seek_latency: Duration,
    seek_done_at: Option<Duration>,
    // Native position at `anchor`; advances from there while not paused.
    position: f64,
    anchor: Duration,
    paused: bool,
    rate: f64,
    drift: f64,
    looping: bool,
    volume: f64,
    muted: bool,
    amplification: Option<f64>,
    error: Option<MediaErrorCode>,
    frame_size: (u32, u32),
    seeks: u32,
    plays: u32,
    pauses: u32,
}

impl SimulatedHandle {
    /// Handle for `src` that becomes ready immediately.
    pub fn new(
        src: impl Into<String>,
        kind: MediaKind,
        duration: f64,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let now = clock.now();
        Self {
            src: src.into(),
            kind,
            clock,
            duration: duration.max(0.0),
            ready_at: now,
            load_latency: Duration::ZERO,
            seek_latency: Duration::ZERO,
            seek_done_at: None,
            position: 0.0,
            anchor: now,
            paused: true,
            rate: 1.0,
            drift: 0.0,
            looping: false,
            volume: 1.0,
            muted: false,
            amplification: None,
            error: None,
            frame_size: (2, 2),
            seeks: 0,
            plays: 0,
            pauses: 0,
        }
    }

    /// Delay buffering by `latency` from now.
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self.ready_at = self.clock.now() + latency;
        self
    }

    /// Make every seek take `latency` to complete.
    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    /// Let the native clock run `drift` faster (positive) or slower (negative) than requested.
    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    /// Report `code` from now on.
    pub fn fail_with(&mut self, code: MediaErrorCode) {
        self.error = Some(code);
    }

    /// Number of native seeks issued so far.
    pub fn seek_count(&self) -> u32 {
        self.seeks
    }

    /// Number of native `play` calls so far.
    pub fn play_count(&self) -> u32 {
        self.plays
    }

    /// Number of native `pause` calls so far.
    pub fn pause_count(&self) -> u32 {
        self.pauses
    }

    /// Native volume last applied.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Native mute flag.
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Amplification gain last applied, if any.
    pub fn amplification(&self) -> Option<f64> {
        self.amplification
    }

    /// Native playback rate.
    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn seeking_at(&self, now: Duration) -> bool {
        self.seek_done_at.is_some_and(|done| now < done)
    }

    fn position_at(&self, now: Duration) -> f64 {
        if self.paused {
            return self.position;
        }
        // The native clock holds still until a pending seek lands.
        let from = match self.seek_done_at {
            Some(done) if done > self.anchor => done,
            _ => self.anchor,
        };
        let elapsed = now.saturating_sub(from).as_secs_f64();
        let t = self.position + elapsed * self.rate * (1.0 + self.drift);
        if self.looping && self.duration > 0.0 {
            t.rem_euclid(self.duration)
        } else {
            t.min(self.duration)
        }
    }

    fn rebase(&mut self) {
        let now = self.clock.now();
        self.position = self.position_at(now);
        self.anchor = now;
    }
}

impl MediaHandle for SimulatedHandle {
    fn src(&self) -> &str {
        &self.src
    }

    fn load(&mut self, src: &str) {
        let now = self.clock.now();
        self.src = src.to_string();
        self.ready_at = now + self.load_latency;
        self.seek_done_at = None;
        self.position = 0.0;
        self.anchor = now;
        self.paused = true;
        self.error = None;
    }

    fn ready_state(&self) -> ReadyState {
        let now = self.clock.now();
        if self.error.is_some() || now < self.ready_at {
            return ReadyState::HaveNothing;
        }
        if self.seeking_at(now) {
            return ReadyState::HaveMetadata;
        }
        ReadyState::HaveEnoughData
    }

    fn current_time(&self) -> f64 {
        self.position_at(self.clock.now())
    }

    fn set_current_time(&mut self, secs: f64) {
        let now = self.clock.now();
        self.position = secs.clamp(0.0, self.duration);
        self.anchor = now;
        self.seek_done_at = Some(now + self.seek_latency);
        self.seeks += 1;
    }

    fn is_seeking(&self) -> bool {
        self.seeking_at(self.clock.now())
    }

    fn duration(&self) -> Option<f64> {
        (self.clock.now() >= self.ready_at).then_some(self.duration)
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn play(&mut self) -> ScenecastResult<()> {
        if let Some(code) = self.error {
            return Err(ScenecastError::media(code.describe()));
        }
        self.plays += 1;
        if self.paused {
            self.anchor = self.clock.now();
            self.paused = false;
        }
        Ok(())
    }

    fn pause(&mut self) {
        self.pauses += 1;
        if !self.paused {
            self.rebase();
            self.paused = true;
        }
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rebase();
        self.rate = rate;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn error(&self) -> Option<MediaErrorCode> {
        self.error
    }

    fn set_amplification(&mut self, gain: f64) -> bool {
        self.amplification = Some(gain);
        true
    }

    fn current_frame(&self) -> Option<FrameRGBA> {
        if self.kind != MediaKind::Video || self.ready_state() < ReadyState::HaveCurrentData {
            return None;
        }
        let (w, h) = self.frame_size;
        // Encode the presented time (deciseconds) into the red channel.
        let shade = (self.current_time() * 10.0).round().clamp(0.0, 255.0) as u8;
        let mut data = Vec::with_capacity((w * h * 4) as usize);
        for _ in 0..w * h {
            data.extend_from_slice(&[shade, 0, 0, 255]);
        }
        Some(FrameRGBA {
            width: w,
            height: h,
            data,
            premultiplied: true,
        })
    }
}

/// [`HandleFactory`] producing [`SimulatedHandle`]s that share one clock.
pub struct SimulatedFactory {
    clock: Rc<dyn Clock>,
    duration: f64,
    load_latency: Duration,
    seek_latency: Duration,
    created: Cell<u32>,
}

impl SimulatedFactory {
    /// Factory for handles of `duration` seconds on `clock`.
    pub fn new(clock: Rc<dyn Clock>, duration: f64) -> Self {
        Self {
            clock,
            duration,
            load_latency: Duration::ZERO,
            seek_latency: Duration::ZERO,
            created: Cell::new(0),
        }
    }

    /// Buffering latency applied to every new handle.
    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    /// Seek latency applied to every new handle.
    pub fn with_seek_latency(mut self, latency: Duration) -> Self {
        self.seek_latency = latency;
        self
    }

    /// Number of handles created so far.
    pub fn created(&self) -> u32 {
        self.created.get()
    }
}

impl HandleFactory for SimulatedFactory {
    type Handle = SimulatedHandle;

    fn create(&self, src: &str, kind: MediaKind) -> ScenecastResult<SimulatedHandle> {
        self.created.set(self.created.get() + 1);
        Ok(
            SimulatedHandle::new(src, kind, self.duration, self.clock.clone())
                .with_load_latency(self.load_latency)
                .with_seek_latency(self.seek_latency),
        )
    }
}
