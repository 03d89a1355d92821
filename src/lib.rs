//! Scenecast keeps media-backed scene nodes in step with a virtual timeline and renders their
//! audio into the exported video.
//!
//! # Pipeline overview
//!
//! 1. **Pool**: scene nodes borrow native media handles from an [`AssetPool`] keyed by source.
//! 2. **Sync**: every draw tick a node's [`MediaSync`] decides whether to seek, play or pause its
//!    handle so the native clock follows virtual timeline time.
//! 3. **Decode**: [`select_decoder`] picks native playback or an out-of-band frame extractor
//!    depending on playback mode, format and overrides.
//! 4. **Collect**: nodes that are logically playing register an [`AssetFrameRecord`] per frame.
//! 5. **Export**: [`extract_media_assets`] reconstructs each asset's placement, then
//!    [`generate_audio`] isolates and mixes audio and [`merge_media`] muxes it with the visuals.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Virtual time is authoritative**: a native handle's clock is always derived from it.
//! - **Single-threaded cooperative scheduling**: the host loop drives every node; nothing here
//!   spawns worker threads beyond subprocess pipe drains.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod audio;
mod config;
mod decode;
mod effects;
mod encode;
mod export;
mod foundation;
mod media;

pub use assets::probe::{MediaProbe, probe_media};
pub use assets::source::{
    PENDING_KEY_PREFIX, normalize_source_key, pending_key, sanitize_file_stem,
};
pub use audio::filters::{IsolationPlan, atempo_filters, plan_isolation, tempo_stages};
pub use audio::render::{
    AudioJob, MIX_CHANNELS, MIX_FILE_NAME, MIX_SAMPLE_RATE, generate_audio, merge_media,
    mix_tracks,
};
pub use audio::timeline::{AssetFrameRecord, MediaAsset, extract_media_assets};
pub use config::{BackoffConfig, ExportSettings, SyncConfig};
pub use decode::detect::{
    ContainerFormat, ContentTypeProbe, FormatFamily, HttpProbe, NoProbe, detect_format,
};
pub use decode::extract::{
    CachedExtractor, FfmpegFrameExtractor, FrameExtractor, SequentialFrameExtractor,
};
pub use decode::selector::{DecoderKind, DecoderOverride, select_decoder};
pub use effects::{EffectCompositor, ShaderEffect, apply_effects};
pub use encode::format::OutputFormat;
pub use encode::process::{FfmpegCommand, is_ffmpeg_on_path, is_ffprobe_on_path};
pub use encode::sink::{FrameRGBA, FrameSink, InMemorySink, SinkConfig};
pub use encode::visuals::{VISUALS_FILE_STEM, VisualTrackSink};
pub use export::{ExportSession, TEMP_DIR_SENTINEL, TempDir};
pub use foundation::cancel::CancelToken;
pub use foundation::core::{FrameContext, FrameIndex, FrameRange, Fps, MediaKind, PlaybackMode};
pub use foundation::error::{ScenecastError, ScenecastResult};
pub use media::clock::{Clock, ManualClock, SystemClock};
pub use media::collect::AssetCollector;
pub use media::context::MediaContext;
pub use media::handle::{MediaErrorCode, MediaHandle, ReadyState};
pub use media::node::{AudioNode, MediaElement, MediaNode, NodeId, VideoNode};
pub use media::pool::{AssetPool, HandleFactory, SharedHandle};
pub use media::retry::{Backoff, Readiness, wait_until_ready};
pub use media::simulated::{SimulatedFactory, SimulatedHandle};
pub use media::sync::{MediaSync, SeekOutcome, SyncState, clamp_time};
