use std::rc::Rc;

use crate::assets::source::{PENDING_KEY_PREFIX, normalize_source_key, pending_key};
use crate::audio::timeline::AssetFrameRecord;
use crate::config::SyncConfig;
use crate::decode::detect::{ContainerFormat, ContentTypeProbe, HttpProbe, detect_format};
use crate::decode::extract::{
    CachedExtractor, FfmpegFrameExtractor, FrameExtractor, SequentialFrameExtractor,
};
use crate::decode::selector::{DecoderKind, DecoderOverride, select_decoder};
use crate::effects::{EffectCompositor, ShaderEffect, apply_effects};
use crate::encode::sink::FrameRGBA;
use crate::foundation::core::{Fps, FrameContext, MediaKind};
use crate::foundation::error::ScenecastResult;
use crate::media::clock::Clock;
use crate::media::context::MediaContext;
use crate::media::handle::MediaHandle;
use crate::media::pool::{HandleFactory, SharedHandle};
use crate::media::sync::{MediaSync, SeekOutcome, SyncState};

/// Identity of a scene node within a [`MediaContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

type HandleOf<F> = <F as HandleFactory>::Handle;

/// State and behavior shared by every media-backed node.
///
/// Owns the node's [`MediaSync`] and borrows a pooled handle. Concrete node kinds compose it and
/// add their own frame acquisition.
pub struct MediaNode<F: HandleFactory> {
    id: NodeId,
    kind: MediaKind,
    key: String,
    src: Option<String>,
    handle: Option<SharedHandle<HandleOf<F>>>,
    pool_key: Option<String>,
    sync: MediaSync,
    volume: f64,
    muted: bool,
    volume_dirty: bool,
    amplified: bool,
    allow_amplification: bool,
}

impl<F: HandleFactory> MediaNode<F> {
    /// Node without a source. Its key defaults to `<kind>-<id>`.
    pub fn new(id: NodeId, kind: MediaKind, config: &SyncConfig) -> Self {
        let prefix = match kind {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        };
        Self {
            id,
            kind,
            key: format!("{prefix}-{}", id.0),
            src: None,
            handle: None,
            pool_key: None,
            sync: MediaSync::new(kind, config.clone()),
            volume: 1.0,
            muted: false,
            volume_dirty: true,
            amplified: false,
            allow_amplification: config.allow_volume_amplification,
        }
    }

    /// Replace the asset key used in frame records.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Set the source.
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Media kind.
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Asset key used in frame records.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Source locator, once resolved.
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Change the source; the handle is re-resolved on the next tick or [`MediaNode::attach`].
    pub fn set_src(&mut self, src: Option<String>) {
        self.src = src;
    }

    /// Handle currently borrowed from the pool.
    pub fn handle(&self) -> Option<SharedHandle<HandleOf<F>>> {
        self.handle.clone()
    }

    /// Synchronization core.
    pub fn sync(&self) -> &MediaSync {
        &self.sync
    }

    /// Synchronization core, mutably.
    pub fn sync_mut(&mut self) -> &mut MediaSync {
        &mut self.sync
    }

    /// Logical playing flag.
    pub fn is_playing(&self) -> bool {
        self.sync.is_playing()
    }

    /// Virtual time at the latest host tick.
    pub fn time(&self) -> f64 {
        self.sync.time()
    }

    /// Requested linear gain.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Start playback. Without timeline context the native `play` is issued right away.
    pub fn play(&mut self) {
        match (&self.handle, self.src.is_some() && !self.sync.has_context()) {
            (Some(handle), true) => self.sync.play_detached(&mut *handle.borrow_mut()),
            _ => self.sync.play(),
        }
    }

    /// Pause playback, keeping the current time.
    pub fn pause(&mut self) {
        self.sync.pause();
    }

    /// Move to `t` and seek the handle unless it already shows that time.
    pub fn seek(&mut self, t: f64) -> f64 {
        let t = self.sync.seek(t);
        if let Some(handle) = &self.handle
            && self.src.is_some()
        {
            self.sync.apply_seek(&mut *handle.borrow_mut(), t);
        }
        t
    }

    /// Change the playback rate.
    pub fn set_playback_rate(&mut self, rate: f64) -> ScenecastResult<()> {
        self.sync.set_playback_rate(rate)
    }

    /// Enable or disable looping.
    pub fn set_loop(&mut self, looping: bool) {
        self.sync.set_loop(looping);
    }

    /// Set the linear gain. Negative values are clamped to zero.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = if volume.is_nan() || volume < 0.0 {
            tracing::warn!(key = %self.key, volume, "negative volume clamped to 0");
            0.0
        } else {
            volume
        };
        self.volume = volume;
        self.volume_dirty = true;
    }

    /// Mute or unmute.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.volume_dirty = true;
    }

    /// Borrow the pooled handle matching the current source, migrating or switching as needed.
    pub fn attach(
        &mut self,
        ctx: &mut MediaContext<F>,
    ) -> ScenecastResult<SharedHandle<HandleOf<F>>> {
        let wanted = match &self.src {
            Some(src) => normalize_source_key(src)?,
            None => pending_key(self.id.0),
        };
        if let (Some(handle), Some(key)) = (&self.handle, &self.pool_key)
            && *key == wanted
            && ctx.pool().contains_key(key)
        {
            return Ok(handle.clone());
        }

        // Pending entries migrate inside `acquire`.
        if let Some(old) = self.pool_key.take()
            && !old.starts_with(PENDING_KEY_PREFIX)
        {
            ctx.pool_mut().unborrow(&old, self.id);
        }
        let handle = match &self.src {
            Some(src) => ctx.pool_mut().acquire(self.id, src, self.kind)?,
            None => ctx.pool_mut().acquire_pending(self.id, self.kind)?,
        };
        tracing::debug!(key = %self.key, pool_key = %wanted, "attached media handle");
        self.sync.reset_native();
        self.volume_dirty = true;
        self.pool_key = Some(wanted);
        self.handle = Some(handle.clone());
        Ok(handle)
    }

    /// Return the handle to the pool.
    pub fn release(&mut self, ctx: &mut MediaContext<F>) {
        ctx.pool_mut().release(self.id);
        self.handle = None;
        self.pool_key = None;
        self.sync.reset_native();
    }

    /// Blocking seek of the borrowed handle to the current virtual time.
    pub fn seeked_media(
        &mut self,
        clock: &dyn Clock,
        frame: &FrameContext,
    ) -> ScenecastResult<SeekOutcome> {
        let Some(handle) = self.handle.clone() else {
            return Ok(SeekOutcome::Skipped);
        };
        self.sync
            .seeked_media(&mut *handle.borrow_mut(), clock, frame.time, frame.mode)
    }

    /// Tolerance-based resync of the borrowed handle.
    pub fn fast_seeked_media(&mut self, frame: &FrameContext) -> SeekOutcome {
        match self.handle.clone() {
            Some(handle) => self
                .sync
                .fast_seeked_media(&mut *handle.borrow_mut(), frame.time),
            None => SeekOutcome::Skipped,
        }
    }

    /// Frame record for `frame`, present while the node is logically playing.
    pub fn record(&self, frame: &FrameContext) -> Option<AssetFrameRecord> {
        let src = self.src.as_ref()?;
        if !self.sync.is_playing() {
            return None;
        }
        Some(AssetFrameRecord {
            key: self.key.clone(),
            src: src.clone(),
            kind: self.kind,
            current_time: self.sync.time_at(frame.time),
            playback_rate: self.sync.playback_rate(),
            volume: if self.muted { 0.0 } else { self.volume },
        })
    }

    fn register(&self, ctx: &mut MediaContext<F>, frame: &FrameContext) {
        if let Some(record) = self.record(frame) {
            ctx.collector_mut().register(record);
        }
    }

    /// Follow the timeline and register the frame record without steering the handle.
    pub fn observe(
        &mut self,
        ctx: &mut MediaContext<F>,
        frame: &FrameContext,
    ) -> ScenecastResult<()> {
        let handle = self.attach(ctx)?;
        self.sync.observe(frame);
        if self.src.is_some() && self.claim(ctx, frame) {
            let mut h = handle.borrow_mut();
            if !h.is_paused() {
                h.pause();
            }
        }
        self.register(ctx, frame);
        Ok(())
    }

    fn claim(&self, ctx: &mut MediaContext<F>, frame: &FrameContext) -> bool {
        match self.pool_key.as_deref() {
            Some(key) => ctx.pool_mut().claim_driver(key, self.id, frame.tick),
            None => true,
        }
    }

    /// Run one host tick: drive the handle when this node is the tick's driver, then register the
    /// frame record.
    pub fn tick(
        &mut self,
        ctx: &mut MediaContext<F>,
        frame: &FrameContext,
    ) -> ScenecastResult<SyncState> {
        let handle = self.attach(ctx)?;
        if self.src.is_none() {
            self.sync.observe(frame);
            return Ok(SyncState::Idle);
        }

        let state = if self.claim(ctx, frame) {
            let mut h = handle.borrow_mut();
            let state = self.sync.drive(&mut *h, frame, ctx.clock())?;
            if self.volume_dirty {
                self.apply_volume(&mut *h);
            }
            state
        } else {
            tracing::trace!(
                key = %self.key,
                tick = frame.tick,
                "shared handle driven by another node"
            );
            self.sync.observe(frame);
            self.sync.state()
        };
        self.register(ctx, frame);
        Ok(state)
    }

    fn apply_volume(&mut self, h: &mut HandleOf<F>) {
        h.set_muted(self.muted);
        if self.volume > 1.0 {
            h.set_volume(1.0);
            if !self.allow_amplification {
                tracing::warn!(
                    key = %self.key,
                    volume = self.volume,
                    "volume above 1 needs amplification opt-in; capped at 1"
                );
            } else if h.set_amplification(self.volume) {
                self.amplified = true;
            } else {
                tracing::warn!(key = %self.key, "handle cannot amplify; volume capped at 1");
            }
        } else {
            h.set_volume(self.volume);
            if self.amplified {
                h.set_amplification(1.0);
                self.amplified = false;
            }
        }
        self.volume_dirty = false;
    }
}

/// Capability contract of a media-backed scene node.
///
/// Node kinds share seek/play/pause/volume through the composed [`MediaNode`] and specialize
/// how frames are acquired in [`MediaElement::tick`].
pub trait MediaElement {
    /// Factory of the handles this node borrows.
    type Factory: HandleFactory;

    /// Shared node state.
    fn node(&self) -> &MediaNode<Self::Factory>;

    /// Shared node state, mutably.
    fn node_mut(&mut self) -> &mut MediaNode<Self::Factory>;

    /// Advance one host tick.
    fn tick(
        &mut self,
        ctx: &mut MediaContext<Self::Factory>,
        frame: &FrameContext,
    ) -> ScenecastResult<SyncState>;

    /// Native handle currently steered by this node.
    fn media_element(&self) -> Option<SharedHandle<HandleOf<Self::Factory>>> {
        self.node().handle()
    }

    /// Bring the handle exactly to the current virtual time and wait until it can present it.
    fn seeked_media(
        &mut self,
        clock: &dyn Clock,
        frame: &FrameContext,
    ) -> ScenecastResult<SeekOutcome> {
        self.node_mut().seeked_media(clock, frame)
    }

    /// Resync the handle only when it drifted beyond tolerance.
    fn fast_seeked_media(&mut self, frame: &FrameContext) -> SeekOutcome {
        self.node_mut().fast_seeked_media(frame)
    }

    /// Start playback.
    fn play(&mut self) {
        self.node_mut().play();
    }

    /// Pause playback.
    fn pause(&mut self) {
        self.node_mut().pause();
    }

    /// Seek to `t`; returns the clamped time.
    fn seek(&mut self, t: f64) -> f64 {
        self.node_mut().seek(t)
    }

    /// Logical playing flag.
    fn is_playing(&self) -> bool {
        self.node().is_playing()
    }

    /// Virtual time.
    fn time(&self) -> f64 {
        self.node().time()
    }
}

/// Audio-only node; the handle is the whole story.
pub struct AudioNode<F: HandleFactory> {
    node: MediaNode<F>,
}

impl<F: HandleFactory> AudioNode<F> {
    /// Audio node with id `id`.
    pub fn new(id: NodeId, config: &SyncConfig) -> Self {
        Self {
            node: MediaNode::new(id, MediaKind::Audio, config),
        }
    }

    /// Set the source.
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.node = self.node.with_src(src);
        self
    }
}

impl<F: HandleFactory> MediaElement for AudioNode<F> {
    type Factory = F;

    fn node(&self) -> &MediaNode<F> {
        &self.node
    }

    fn node_mut(&mut self) -> &mut MediaNode<F> {
        &mut self.node
    }

    fn tick(
        &mut self,
        ctx: &mut MediaContext<F>,
        frame: &FrameContext,
    ) -> ScenecastResult<SyncState> {
        self.node.tick(ctx, frame)
    }
}

type BoxedExtractor = CachedExtractor<Box<dyn FrameExtractor>>;

/// Video node: native playback while live, [`select_decoder`]-chosen frame source otherwise.
pub struct VideoNode<F: HandleFactory> {
    node: MediaNode<F>,
    decoder_override: Option<DecoderOverride>,
    format: Option<ContainerFormat>,
    probe: Rc<dyn ContentTypeProbe>,
    extractor: Option<(DecoderKind, BoxedExtractor)>,
    decoder: Option<DecoderKind>,
    effects: Vec<ShaderEffect>,
    frame: Option<FrameRGBA>,
}

impl<F: HandleFactory> VideoNode<F> {
    /// Video node with id `id`, probing remote formats over HTTP.
    pub fn new(id: NodeId, config: &SyncConfig) -> Self {
        Self {
            node: MediaNode::new(id, MediaKind::Video, config),
            decoder_override: None,
            format: None,
            probe: Rc::new(HttpProbe::default()),
            extractor: None,
            decoder: None,
            effects: Vec::new(),
            frame: None,
        }
    }

    /// Set the source.
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.node = self.node.with_src(src);
        self.format = None;
        self
    }

    /// Force a decoder.
    pub fn with_decoder_override(mut self, ovr: DecoderOverride) -> Self {
        self.decoder_override = Some(ovr);
        self
    }

    /// Use `probe` for remote format detection.
    pub fn with_probe(mut self, probe: Rc<dyn ContentTypeProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Use `extractor` whenever the selector picks `kind` for this node's source.
    pub fn with_extractor(mut self, kind: DecoderKind, extractor: Box<dyn FrameExtractor>) -> Self {
        self.extractor = Some((kind, CachedExtractor::new(extractor)));
        self
    }

    /// Replace the effect list.
    pub fn set_effects(&mut self, effects: Vec<ShaderEffect>) {
        self.effects = effects;
    }

    /// Decoder chosen on the latest tick.
    pub fn decoder(&self) -> Option<DecoderKind> {
        self.decoder
    }

    /// Raw frame acquired on the latest tick.
    pub fn frame(&self) -> Option<&FrameRGBA> {
        self.frame.as_ref()
    }

    /// Latest frame with effects composited on top.
    pub fn composited_frame(
        &self,
        compositor: &dyn EffectCompositor,
    ) -> ScenecastResult<Option<FrameRGBA>> {
        self.frame
            .clone()
            .map(|f| apply_effects(compositor, f, &self.effects))
            .transpose()
    }

    fn extractor_for(
        &mut self,
        kind: DecoderKind,
        src: &str,
        fps: Fps,
    ) -> ScenecastResult<&mut BoxedExtractor> {
        let entry = match self.extractor.take() {
            Some((k, ex)) if k == kind && ex.src() == src => (k, ex),
            _ => {
                let inner: Box<dyn FrameExtractor> = match kind {
                    DecoderKind::FfmpegExtract => Box::new(FfmpegFrameExtractor::new(src)?),
                    _ => Box::new(SequentialFrameExtractor::new(src, fps)?),
                };
                tracing::debug!(key = %self.node.key(), ?kind, "frame extractor created");
                (kind, CachedExtractor::new(inner))
            }
        };
        Ok(&mut self.extractor.insert(entry).1)
    }
}

impl<F: HandleFactory> MediaElement for VideoNode<F> {
    type Factory = F;

    fn node(&self) -> &MediaNode<F> {
        &self.node
    }

    fn node_mut(&mut self) -> &mut MediaNode<F> {
        &mut self.node
    }

    fn tick(
        &mut self,
        ctx: &mut MediaContext<F>,
        frame: &FrameContext,
    ) -> ScenecastResult<SyncState> {
        let Some(src) = self.node.src().map(str::to_string) else {
            self.frame = None;
            return self.node.tick(ctx, frame);
        };

        let probe = self.probe.clone();
        let format = &mut self.format;
        let kind = select_decoder(frame.mode, self.decoder_override, || {
            *format.get_or_insert_with(|| detect_format(&src, probe.as_ref()))
        });
        if self.decoder != Some(kind) {
            tracing::debug!(key = %self.node.key(), ?kind, mode = ?frame.mode, "decoder selected");
            self.decoder = Some(kind);
        }

        if kind.is_extraction() {
            self.node.observe(ctx, frame)?;
            let t = self.node.time();
            let image = self.extractor_for(kind, &src, frame.fps)?.frame_at(t)?;
            self.frame = Some(image);
            return Ok(SyncState::Synced);
        }

        let state = self.node.tick(ctx, frame)?;
        match state {
            SyncState::Idle => self.frame = None,
            _ => {
                if let Some(handle) = self.node.handle()
                    && let Some(image) = handle.borrow().current_frame()
                {
                    self.frame = Some(image);
                }
            }
        }
        Ok(state)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/node.rs"]
mod tests;
