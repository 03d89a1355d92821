use crate::config::SyncConfig;
use crate::foundation::core::{FrameContext, MediaKind, PlaybackMode};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::media::clock::Clock;
use crate::media::handle::{MediaErrorCode, MediaHandle, ReadyState};
use crate::media::retry::{Readiness, ReadinessGate, is_ready, wait_until_ready};

/// Clamp `t` into a media's playable span.
///
/// With a known positive `duration`, non-looping media clamp into `[0, duration]` and looping media
/// wrap with `t mod duration`. With unknown duration only negative times are clamped. Non-finite
/// input maps to `0`.
pub fn clamp_time(t: f64, duration: Option<f64>, looping: bool) -> f64 {
    if !t.is_finite() {
        return 0.0;
    }
    match duration {
        Some(d) if d.is_finite() && d > 0.0 => {
            if looping {
                t.rem_euclid(d)
            } else {
                t.clamp(0.0, d)
            }
        }
        _ => t.max(0.0),
    }
}

/// Observable synchronization state of one node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// The handle is not usable (never polled, or reported an error).
    Idle,
    /// A seek was issued or buffering is in progress.
    Seeking,
    /// The handle shows exactly the virtual time and is not running.
    Synced,
    /// The native clock runs and tracks virtual time within tolerance.
    Playing,
    /// The node is paused and its handle is ready at the virtual time.
    Paused,
}

/// Result of asking the handle to move to a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekOutcome {
    /// The handle was already at that time; nothing was issued.
    Skipped,
    /// A native seek was issued. `busy` is `true` when the handle reports it in flight.
    Issued {
        /// Seek still in progress right after issuing.
        busy: bool,
    },
}

// Virtual time anchor: media time `media` at timeline time `timeline`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct TimeAnchor {
    timeline: f64,
    media: f64,
}

/// Playback synchronization core for a single media-backed node.
///
/// The virtual `time` is authoritative. While playing it is projected from the host timeline:
/// `media_at_anchor + (timeline_now - timeline_at_anchor) * rate`. The native handle is only ever
/// steered toward that value.
#[derive(Clone, Debug)]
pub struct MediaSync {
    kind: MediaKind,
    cfg: SyncConfig,
    time: f64,
    playing: bool,
    rate: f64,
    looping: bool,
    duration: Option<f64>,
    last_time: Option<f64>,
    anchor: Option<TimeAnchor>,
    gate: ReadinessGate,
    state: SyncState,
    last_timeline: Option<f64>,
    native_dirty: bool,
}

impl MediaSync {
    /// Paused core at time zero.
    pub fn new(kind: MediaKind, cfg: SyncConfig) -> Self {
        let gate = ReadinessGate::new(&cfg.backoff);
        Self {
            kind,
            cfg,
            time: 0.0,
            playing: false,
            rate: 1.0,
            looping: false,
            duration: None,
            last_time: None,
            anchor: None,
            gate,
            state: SyncState::Idle,
            last_timeline: None,
            native_dirty: true,
        }
    }

    /// Media kind this core was built for.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Current synchronization state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Readiness of the non-blocking gate used in live modes.
    pub fn readiness(&self) -> Readiness {
        self.gate.state()
    }

    /// Logical playing flag (intent, not the native state).
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Playback rate multiplier.
    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    /// Looping flag.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Duration learned from the handle, if known.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Time last applied to the native handle.
    pub fn applied_time(&self) -> Option<f64> {
        self.last_time
    }

    /// `true` once a host tick supplied timeline context.
    pub fn has_context(&self) -> bool {
        self.last_timeline.is_some()
    }

    /// Drift tolerated by fast seeks for this media kind.
    pub fn drift_tolerance(&self) -> f64 {
        match self.kind {
            MediaKind::Video => self.cfg.video_drift_tolerance,
            MediaKind::Audio => self.cfg.audio_drift_tolerance,
        }
    }

    /// Clamp `t` with this node's duration and looping flag.
    pub fn clamp(&self, t: f64) -> f64 {
        clamp_time(t, self.duration, self.looping)
    }

    /// Virtual time at host timeline time `timeline`.
    pub fn time_at(&self, timeline: f64) -> f64 {
        match self.anchor {
            Some(a) if self.playing => {
                self.clamp(a.media + (timeline - a.timeline) * self.rate)
            }
            _ => self.clamp(self.time),
        }
    }

    /// Virtual time at the most recent host tick.
    pub fn time(&self) -> f64 {
        self.time_at(self.now_timeline())
    }

    fn now_timeline(&self) -> f64 {
        self.last_timeline
            .or(self.anchor.map(|a| a.timeline))
            .unwrap_or(0.0)
    }

    fn reanchor(&mut self, media: f64) {
        self.anchor = Some(TimeAnchor {
            timeline: self.now_timeline(),
            media,
        });
    }

    /// Mark the node as playing. The native `play` is issued by a later tick once the handle is
    /// ready; reads of [`MediaSync::is_playing`] see the new state immediately.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        let media = self.clamp(self.time);
        self.playing = true;
        self.reanchor(media);
    }

    /// Play without timeline context: set the intent and issue the native `play` right away.
    /// Failures are only logged.
    pub fn play_detached<H: MediaHandle + ?Sized>(&mut self, handle: &mut H) {
        self.play();
        match handle.play() {
            Ok(()) => self.last_time = None,
            Err(e) => tracing::warn!(src = handle.src(), error = %e, "detached play failed"),
        }
    }

    /// Mark the node as paused and persist the current virtual time.
    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.time = self.time();
        self.playing = false;
        self.anchor = None;
    }

    /// Move virtual time to `t` (clamped). Returns the clamped time.
    pub fn seek(&mut self, t: f64) -> f64 {
        let t = self.clamp(t);
        self.time = t;
        if self.playing {
            self.reanchor(t);
        }
        t
    }

    /// Change the rate multiplier. While playing, time is re-anchored at the current instant so
    /// the projection stays continuous.
    pub fn set_playback_rate(&mut self, rate: f64) -> ScenecastResult<()> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(ScenecastError::validation(format!(
                "playback rate must be finite and >= 0, got {rate}"
            )));
        }
        if self.playing {
            let media = self.time();
            self.reanchor(media);
        }
        self.rate = rate;
        self.native_dirty = true;
        Ok(())
    }

    /// Enable or disable looping.
    pub fn set_loop(&mut self, looping: bool) {
        if self.looping != looping {
            self.looping = looping;
            self.native_dirty = true;
        }
    }

    /// Forget per-handle state after the node switched to another handle.
    pub fn reset_native(&mut self) {
        self.last_time = None;
        self.duration = None;
        self.gate.reset();
        self.native_dirty = true;
        self.state = SyncState::Idle;
    }

    /// Move the handle to `t` unless it is already there.
    ///
    /// Calling this twice with the same `t` issues at most one native seek.
    pub fn apply_seek<H: MediaHandle + ?Sized>(&mut self, handle: &mut H, t: f64) -> SeekOutcome {
        let t = self.clamp(t);
        if self.last_time == Some(t) {
            return SeekOutcome::Skipped;
        }
        self.issue_seek(handle, t)
    }

    fn issue_seek<H: MediaHandle + ?Sized>(&mut self, handle: &mut H, t: f64) -> SeekOutcome {
        handle.set_current_time(t);
        self.last_time = Some(t);
        SeekOutcome::Issued {
            busy: handle.is_seeking(),
        }
    }

    /// Blocking seek: force the handle to the exact virtual time and wait until it can show it.
    ///
    /// In [`PlaybackMode::Rendering`] the wait always happens; otherwise it is skipped when the
    /// handle already buffered ahead of the position.
    pub fn seeked_media<H: MediaHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        clock: &dyn Clock,
        timeline: f64,
        mode: PlaybackMode,
    ) -> ScenecastResult<SeekOutcome> {
        let t = self.time_at(timeline);
        let outcome = self.apply_seek(handle, t);
        let buffered = is_ready(handle, ReadyState::HaveFutureData);
        if mode.is_rendering() || !buffered {
            wait_until_ready(
                handle,
                self.cfg.min_ready_state,
                clock,
                &self.cfg.backoff,
                self.cfg.readiness_timeout(),
            )?;
        }
        Ok(outcome)
    }

    /// Fast seek: resync only when native drift exceeds the kind's tolerance, letting the native
    /// clock run freely otherwise.
    ///
    /// The native position moves on its own afterwards, so the applied time is forgotten and the
    /// next blocking seek always reaches the handle.
    pub fn fast_seeked_media<H: MediaHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        timeline: f64,
    ) -> SeekOutcome {
        let t = self.time_at(timeline);
        let drift = (handle.current_time() - t).abs();
        let outcome = if drift > self.drift_tolerance() {
            tracing::debug!(src = handle.src(), drift, target = t, "resyncing drifted media");
            self.issue_seek(handle, t)
        } else {
            SeekOutcome::Skipped
        };
        self.last_time = None;
        outcome
    }

    /// Follow the host timeline without touching any handle.
    ///
    /// Used by borrowers that do not drive their shared handle this tick and by nodes whose frames
    /// come from an extractor.
    pub fn observe(&mut self, ctx: &FrameContext) {
        if !self.has_context() && self.anchor.is_some() {
            // First tick after a detached play: keep the projection continuous.
            let media = self.time_at(self.now_timeline());
            self.anchor = Some(TimeAnchor {
                timeline: ctx.time,
                media,
            });
        }
        self.last_timeline = Some(ctx.time);
    }

    /// Advance the state machine for one host tick.
    ///
    /// - Rendering: native stays paused, blocking seek to the exact virtual time every tick.
    /// - Paused: native paused, blocking seek.
    /// - Playing/Presenting: readiness is polled without blocking; once ready the native clock
    ///   runs and is corrected by fast seeks.
    ///
    /// Media errors never fail the tick: they are logged and downgrade the node (except while
    /// rendering, where the node stays logically playing). Readiness timeouts are returned.
    pub fn drive<H: MediaHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        ctx: &FrameContext,
        clock: &dyn Clock,
    ) -> ScenecastResult<SyncState> {
        self.observe(ctx);
        if let Some(d) = handle.duration() {
            self.duration = Some(d);
        }
        if let Some(code) = handle.error() {
            return Ok(self.on_media_error(handle.src(), code, ctx.mode));
        }
        if self.native_dirty {
            handle.set_playback_rate(self.rate);
            handle.set_loop(self.looping);
            self.native_dirty = false;
        }

        let state = match ctx.mode {
            PlaybackMode::Rendering | PlaybackMode::Paused => {
                if !handle.is_paused() {
                    handle.pause();
                }
                match self.seeked_media(handle, clock, ctx.time, ctx.mode) {
                    Ok(_) => {}
                    Err(ScenecastError::Media(msg)) => {
                        tracing::warn!(src = handle.src(), %msg, "media failed during seek");
                        let code = handle.error().unwrap_or(MediaErrorCode::Decode);
                        return Ok(self.on_media_error(handle.src(), code, ctx.mode));
                    }
                    Err(e) => return Err(e),
                }
                if self.playing || ctx.mode.is_rendering() {
                    SyncState::Synced
                } else {
                    SyncState::Paused
                }
            }
            PlaybackMode::Playing | PlaybackMode::Presenting => self.drive_live(handle, ctx, clock)?,
        };
        self.state = state;
        Ok(state)
    }

    fn drive_live<H: MediaHandle + ?Sized>(
        &mut self,
        handle: &mut H,
        ctx: &FrameContext,
        clock: &dyn Clock,
    ) -> ScenecastResult<SyncState> {
        if !self.playing {
            if !handle.is_paused() {
                handle.pause();
            }
            let t = self.time_at(ctx.time);
            self.apply_seek(handle, t);
            let ready = self.gate.poll(handle, self.cfg.min_ready_state, clock.now())?;
            return Ok(if ready {
                SyncState::Paused
            } else {
                SyncState::Seeking
            });
        }

        let buffered = is_ready(handle, ReadyState::HaveFutureData);
        if !buffered && !self.gate.poll(handle, self.cfg.min_ready_state, clock.now())? {
            return Ok(SyncState::Seeking);
        }

        if handle.is_paused() {
            let t = self.time_at(ctx.time);
            self.apply_seek(handle, t);
            if let Err(e) = handle.play() {
                let code = handle.error().unwrap_or(MediaErrorCode::Unknown(0));
                tracing::warn!(src = handle.src(), error = %e, "native play failed");
                return Ok(self.on_media_error(handle.src(), code, ctx.mode));
            }
            self.last_time = None;
            return Ok(SyncState::Playing);
        }

        self.fast_seeked_media(handle, ctx.time);
        Ok(SyncState::Playing)
    }

    fn on_media_error(&mut self, src: &str, code: MediaErrorCode, mode: PlaybackMode) -> SyncState {
        tracing::warn!(src, error = %code.describe(), ?mode, "media handle reported an error");
        if !mode.is_rendering() {
            self.pause();
        }
        self.gate.reset();
        self.state = SyncState::Idle;
        SyncState::Idle
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/sync.rs"]
mod tests;
