use std::collections::HashMap;

use crate::foundation::core::{Fps, MediaKind};

/// Seconds below which a measured asset duration is not trusted.
const MIN_MEASURED_SECS: f64 = 0.1;

/// Presence of one media asset in one rendered frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetFrameRecord {
    /// Stable per-node key.
    pub key: String,
    /// Resolved source locator.
    pub src: String,
    /// Media kind.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Media time shown in this frame, in seconds.
    pub current_time: f64,
    /// Rate multiplier in effect.
    pub playback_rate: f64,
    /// Linear gain in effect.
    pub volume: f64,
}

/// One media asset placed on the master timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Stable per-node key.
    pub key: String,
    /// Resolved source locator.
    pub src: String,
    /// Media kind.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// First frame of appearance (inclusive).
    pub start_in_video: u64,
    /// Last frame of appearance (inclusive).
    pub end_in_video: u64,
    /// `end_in_video - start_in_video + 1`.
    pub duration: u64,
    /// Rate multiplier at first appearance.
    pub playback_rate: f64,
    /// Linear gain at first appearance, never negative.
    pub volume: f64,
    /// Source offset where playback starts.
    pub trim_left_in_seconds: f64,
    /// Timeline span covered by the asset, in seconds.
    pub duration_in_seconds: f64,
}

struct Placement {
    first: AssetFrameRecord,
    start: u64,
    end: u64,
    end_time: f64,
}

/// Reconstruct asset placements from per-frame presence snapshots.
///
/// `frames[i]` holds the assets active in frame `i` of the job. Assets come back in order of first
/// appearance. Rate and volume are taken from the first appearance; the covered duration is
/// `(last time - first time) / rate`, falling back to `duration / fps` when that is below 0.1s
/// (e.g. an asset seen in a single frame) or the rate is not positive.
pub fn extract_media_assets(frames: &[Vec<AssetFrameRecord>], fps: Fps) -> Vec<MediaAsset> {
    let mut order: Vec<Placement> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (frame, records) in frames.iter().enumerate() {
        let frame = frame as u64;
        for record in records {
            match index.get(record.key.as_str()) {
                Some(&i) => {
                    let p = &mut order[i];
                    p.end = frame;
                    p.end_time = record.current_time;
                }
                None => {
                    index.insert(record.key.as_str(), order.len());
                    order.push(Placement {
                        first: record.clone(),
                        start: frame,
                        end: frame,
                        end_time: record.current_time,
                    });
                }
            }
        }
    }

    order
        .into_iter()
        .map(|p| {
            let rate = p.first.playback_rate;
            let duration = p.end - p.start + 1;
            let measured = (p.end_time - p.first.current_time) / rate;
            let duration_in_seconds = if rate > 0.0 && measured >= MIN_MEASURED_SECS {
                measured
            } else {
                fps.frames_to_secs(duration)
            };
            if p.first.volume < 0.0 {
                tracing::warn!(key = %p.first.key, volume = p.first.volume, "negative volume clamped to 0");
            }
            MediaAsset {
                start_in_video: p.start,
                end_in_video: p.end,
                duration,
                playback_rate: rate,
                volume: p.first.volume.max(0.0),
                trim_left_in_seconds: p.first.current_time.max(0.0),
                duration_in_seconds,
                key: p.first.key,
                src: p.first.src,
                kind: p.first.kind,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/audio/timeline.rs"]
mod tests;
