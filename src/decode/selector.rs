use crate::decode::detect::{ContainerFormat, FormatFamily};
use crate::foundation::core::PlaybackMode;

/// Explicit per-node decoder choice.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DecoderOverride {
    /// In-process sequential decode.
    Web,
    /// Out-of-process one-shot extraction through `ffmpeg`.
    Ffmpeg,
    /// Native element with blocking seeks.
    Slow,
}

/// Frame acquisition method picked for one node and tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DecoderKind {
    /// Native element, tolerance-based resync while it plays.
    NativeFastSeek,
    /// Native element, exact blocking seek.
    NativeSeek,
    /// Long-lived in-process decode session.
    WebExtract,
    /// External `ffmpeg` process per frame.
    FfmpegExtract,
}

impl DecoderKind {
    /// `true` for the paths that pull frames outside the native element.
    pub fn is_extraction(self) -> bool {
        matches!(self, Self::WebExtract | Self::FfmpegExtract)
    }
}

/// Pick the frame acquisition method. First matching rule wins:
///
/// 1. live playback always uses the native element with fast seeks;
/// 2. paused scrubbing uses native blocking seeks;
/// 3. an explicit override decides;
/// 4. otherwise the detected format does: webm family goes out of process, manifests stay on
///    the native element, everything else uses the in-process path.
///
/// `format` is only evaluated by rule 4, so remote probing never happens for the other rows.
pub fn select_decoder(
    mode: PlaybackMode,
    ovr: Option<DecoderOverride>,
    format: impl FnOnce() -> ContainerFormat,
) -> DecoderKind {
    match (mode, ovr) {
        (PlaybackMode::Playing | PlaybackMode::Presenting, _) => DecoderKind::NativeFastSeek,
        (PlaybackMode::Paused, _) => DecoderKind::NativeSeek,
        (PlaybackMode::Rendering, Some(DecoderOverride::Slow)) => DecoderKind::NativeSeek,
        (PlaybackMode::Rendering, Some(DecoderOverride::Ffmpeg)) => DecoderKind::FfmpegExtract,
        (PlaybackMode::Rendering, Some(DecoderOverride::Web)) => DecoderKind::WebExtract,
        (PlaybackMode::Rendering, None) => match format().family() {
            FormatFamily::WebM => DecoderKind::FfmpegExtract,
            FormatFamily::Manifest => DecoderKind::NativeSeek,
            FormatFamily::Mp4 => DecoderKind::WebExtract,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/selector.rs"]
mod tests;
