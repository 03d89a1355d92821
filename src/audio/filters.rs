use crate::audio::timeline::MediaAsset;
use crate::foundation::core::{Fps, FrameRange};

/// Smallest factor a single `atempo` stage accepts.
pub const TEMPO_STAGE_MIN: f64 = 0.5;
/// Largest factor a single `atempo` stage accepts.
pub const TEMPO_STAGE_MAX: f64 = 100.0;

const UNITY_EPS: f64 = 1e-9;

/// Split `rate` into factors that each fit one `atempo` stage.
///
/// Rates above 100 emit 100 until the remainder fits; rates below 0.5 emit 0.5 likewise. Unity
/// and non-positive rates need no stage.
pub fn tempo_stages(rate: f64) -> Vec<f64> {
    let mut stages = Vec::new();
    if !rate.is_finite() || rate <= 0.0 {
        return stages;
    }
    let mut rest = rate;
    while rest > TEMPO_STAGE_MAX {
        stages.push(TEMPO_STAGE_MAX);
        rest /= TEMPO_STAGE_MAX;
    }
    while rest < TEMPO_STAGE_MIN {
        stages.push(TEMPO_STAGE_MIN);
        rest /= TEMPO_STAGE_MIN;
    }
    if (rest - 1.0).abs() > UNITY_EPS {
        stages.push(rest);
    }
    stages
}

/// `atempo=<factor>` filters for `rate`, in application order.
pub fn atempo_filters(rate: f64) -> Vec<String> {
    tempo_stages(rate)
        .into_iter()
        .map(|f| format!("atempo={}", num(f)))
        .collect()
}

// Shortest round-trip form, always with a decimal point ("100.0", "0.6").
fn num(v: f64) -> String {
    format!("{v:?}")
}

/// Filter parameters that place one asset's audio on the job timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct IsolationPlan {
    /// Tempo factors, one `atempo` stage each.
    pub tempo: Vec<f64>,
    /// Trim start in post-tempo seconds.
    pub trim_left: f64,
    /// Trim end in post-tempo seconds.
    pub trim_right: f64,
    /// Silence appended after the clip, in source samples.
    pub pad_end_samples: u64,
    /// Silence prepended before the clip, in milliseconds.
    pub pad_start_ms: f64,
    /// Linear gain.
    pub volume: f64,
}

/// Compute the isolation filter parameters of `asset` inside the job `range`.
///
/// `sample_rate` is the asset's native rate; the end pad is counted in those samples so the clip
/// spans the job exactly. One extra frame is kept at the trim end against boundary truncation.
pub fn plan_isolation(
    asset: &MediaAsset,
    range: FrameRange,
    fps: Fps,
    sample_rate: u32,
) -> IsolationPlan {
    let fps_f = fps.as_f64();
    let rate = asset.playback_rate;
    let job_span = range.len_frames().saturating_sub(1) as f64;
    let job_frames = range.len_frames() as f64;
    let sr = f64::from(sample_rate);

    let trim_left = asset.trim_left_in_seconds / rate;
    let trim_right = 1.0 / fps_f
        + (trim_left + asset.duration_in_seconds).min(trim_left + job_span / fps_f);
    let pad_start_ms = asset.start_in_video as f64 / fps_f * 1000.0;
    let pad_end = sr * job_frames / fps_f
        - sr * asset.duration as f64 / fps_f
        - sr * pad_start_ms / 1000.0;

    IsolationPlan {
        tempo: tempo_stages(rate),
        trim_left,
        trim_right,
        pad_end_samples: pad_end.max(0.0).floor() as u64,
        pad_start_ms,
        volume: asset.volume,
    }
}

impl IsolationPlan {
    /// Render the `-af` chain: tempo, trim, pad, delay, volume.
    pub fn filter_chain(&self) -> String {
        let mut filters: Vec<String> = self
            .tempo
            .iter()
            .map(|f| format!("atempo={}", num(*f)))
            .collect();
        filters.push(format!(
            "atrim=start={}:end={}",
            num(self.trim_left),
            num(self.trim_right)
        ));
        filters.push("asetpts=PTS-STARTPTS".to_string());
        filters.push(format!("apad=pad_len={}", self.pad_end_samples));
        filters.push(format!(
            "adelay={}:all=1",
            self.pad_start_ms.max(0.0).round() as u64
        ));
        filters.push(format!("volume={}", num(self.volume)));
        filters.join(",")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/filters.rs"]
mod tests;
