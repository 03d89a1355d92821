use std::path::Path;

use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Stream-level facts about a media source, as reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProbe {
    /// Whether at least one audio stream exists.
    pub has_audio: bool,
    /// Whether at least one video stream exists.
    pub has_video: bool,
    /// Native sample rate of the first audio stream.
    pub sample_rate: Option<u32>,
    /// Width of the first video stream in pixels.
    pub width: Option<u32>,
    /// Height of the first video stream in pixels.
    pub height: Option<u32>,
    /// Container duration in seconds.
    pub duration_secs: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    sample_rate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Probe stream metadata of `source` (file path or URL) through `ffprobe`.
pub fn probe_media(source: &Path) -> ScenecastResult<MediaProbe> {
    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source)
        .output()
        .map_err(|e| ScenecastError::export(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ScenecastError::export(format!(
            "ffprobe failed for '{}': {}",
            source.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

pub(crate) fn parse_probe_json(json: &[u8]) -> ScenecastResult<MediaProbe> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| ScenecastError::serde(format!("ffprobe json parse failed: {e}")))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaProbe {
        has_audio: audio.is_some(),
        has_video: video.is_some(),
        sample_rate: audio
            .and_then(|s| s.sample_rate.as_deref())
            .and_then(|r| r.parse().ok()),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        duration_secs: parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse().ok()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/probe.rs"]
mod tests;
