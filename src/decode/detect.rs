use std::path::Path;
use std::time::Duration;

use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Container format of a video source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// ISO base media (`.mp4`, `.m4v`).
    Mp4,
    /// QuickTime (`.mov`).
    Mov,
    /// WebM (`.webm`).
    WebM,
    /// Matroska (`.mkv`).
    Mkv,
    /// Ogg (`.ogv`, `.ogg`).
    Ogg,
    /// HLS playlist (`.m3u8`).
    Hls,
    /// DASH manifest (`.mpd`).
    Dash,
}

/// Decoder-relevant grouping of container formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatFamily {
    /// ISO-BMFF style containers the in-process decode path handles.
    Mp4,
    /// Bitstream formats the in-process path does not handle.
    WebM,
    /// Streaming manifests (not seekable by the extraction paths).
    Manifest,
}

impl ContainerFormat {
    /// Format implied by a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => Some(Self::Mp4),
            "mov" | "qt" => Some(Self::Mov),
            "webm" => Some(Self::WebM),
            "mkv" => Some(Self::Mkv),
            "ogv" | "ogg" => Some(Self::Ogg),
            "m3u8" => Some(Self::Hls),
            "mpd" => Some(Self::Dash),
            _ => None,
        }
    }

    /// Format implied by an HTTP `Content-Type` value (parameters are ignored).
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "video/mp4" | "video/x-m4v" => Some(Self::Mp4),
            "video/quicktime" => Some(Self::Mov),
            "video/webm" => Some(Self::WebM),
            "video/x-matroska" => Some(Self::Mkv),
            "video/ogg" => Some(Self::Ogg),
            "application/vnd.apple.mpegurl" | "application/x-mpegurl" | "audio/mpegurl" => {
                Some(Self::Hls)
            }
            "application/dash+xml" => Some(Self::Dash),
            _ => None,
        }
    }

    /// Decoder family of this format.
    pub fn family(self) -> FormatFamily {
        match self {
            Self::Mp4 | Self::Mov => FormatFamily::Mp4,
            Self::WebM | Self::Mkv | Self::Ogg => FormatFamily::WebM,
            Self::Hls | Self::Dash => FormatFamily::Manifest,
        }
    }
}

/// Source of `Content-Type` values for remote media.
pub trait ContentTypeProbe {
    /// `Content-Type` reported for `url`, or `None` when the server sends none.
    fn content_type(&self, url: &str) -> ScenecastResult<Option<String>>;
}

/// Probe that never reaches the network.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProbe;

impl ContentTypeProbe for NoProbe {
    fn content_type(&self, _url: &str) -> ScenecastResult<Option<String>> {
        Ok(None)
    }
}

/// `HEAD` request probe backed by `ureq`.
pub struct HttpProbe {
    agent: ureq::Agent,
}

impl HttpProbe {
    /// Probe whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl ContentTypeProbe for HttpProbe {
    fn content_type(&self, url: &str) -> ScenecastResult<Option<String>> {
        let resp = self
            .agent
            .head(url)
            .call()
            .map_err(|e| ScenecastError::media(format!("HEAD '{url}' failed: {e}")))?;
        Ok(resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }
}

fn is_http(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn extension_of(src: &str) -> Option<&str> {
    // Query strings and fragments never carry the extension.
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let name = path.rsplit('/').next().unwrap_or(path);
    Path::new(name).extension().and_then(|e| e.to_str())
}

/// Detect the container format of `src`.
///
/// The extension wins when it names a known format. HTTP sources without one are probed for a
/// `Content-Type`. Any failure logs a warning and falls back to [`ContainerFormat::Mp4`].
pub fn detect_format(src: &str, probe: &dyn ContentTypeProbe) -> ContainerFormat {
    if let Some(format) = extension_of(src).and_then(ContainerFormat::from_extension) {
        return format;
    }

    if !is_http(src) {
        tracing::warn!(src, "unknown media extension, assuming mp4");
        return ContainerFormat::Mp4;
    }

    match probe.content_type(src) {
        Ok(Some(ct)) => ContainerFormat::from_content_type(&ct).unwrap_or_else(|| {
            tracing::warn!(src, content_type = %ct, "unrecognized content type, assuming mp4");
            ContainerFormat::Mp4
        }),
        Ok(None) => {
            tracing::warn!(src, "no content type reported, assuming mp4");
            ContainerFormat::Mp4
        }
        Err(e) => {
            tracing::warn!(src, error = %e, "format probe failed, assuming mp4");
            ContainerFormat::Mp4
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/detect.rs"]
mod tests;
