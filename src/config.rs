use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encode::format::OutputFormat;
use crate::foundation::core::{Fps, FrameRange};
use crate::foundation::error::{ScenecastError, ScenecastResult};
use crate::media::handle::ReadyState;

/// Poll schedule used while waiting for a media handle to become ready.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first re-poll, in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after every attempt.
    pub factor: f64,
    /// Upper bound for a single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Attempts before a live (non-blocking) wait gives up.
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 10,
            factor: 2.0,
            max_delay_ms: 250,
            max_attempts: 40,
        }
    }
}

/// Tuning knobs for media synchronization.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Drift (seconds) tolerated between native and virtual time for video while playing.
    pub video_drift_tolerance: f64,
    /// Drift (seconds) tolerated between native and virtual time for audio while playing.
    pub audio_drift_tolerance: f64,
    /// Hard limit for blocking readiness waits, in milliseconds.
    pub readiness_timeout_ms: u64,
    /// Poll schedule for readiness waits.
    pub backoff: BackoffConfig,
    /// Ready state a handle must reach before play/seek are issued.
    pub min_ready_state: ReadyState,
    /// Allow preview volume above 1.0 through handle amplification.
    pub allow_volume_amplification: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            video_drift_tolerance: 1.0,
            audio_drift_tolerance: 0.3,
            readiness_timeout_ms: 10_000,
            backoff: BackoffConfig::default(),
            min_ready_state: ReadyState::HaveCurrentData,
            allow_volume_amplification: false,
        }
    }
}

impl SyncConfig {
    /// Readiness timeout as a [`Duration`].
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }
}

/// Settings for one export job, usually loaded from JSON.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Directory the final output is written into.
    pub output_dir: PathBuf,
    /// Output file name without extension.
    pub output_filename: String,
    /// Working directory for intermediates. `None` creates an auto-removed directory.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Output container.
    #[serde(default)]
    pub format: OutputFormat,
    /// Scene frame rate.
    pub fps: Fps,
    /// First exported frame (inclusive).
    pub start_frame: u64,
    /// Last exported frame (inclusive).
    pub end_frame: u64,
}

impl ExportSettings {
    /// Parse settings from a JSON string and validate them.
    pub fn from_json(json: &str) -> ScenecastResult<Self> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| ScenecastError::serde(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read and validate settings from a JSON file.
    pub fn from_path(path: &Path) -> ScenecastResult<Self> {
        use anyhow::Context as _;
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read export settings '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Check field-level invariants.
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ScenecastError::validation("fps must be non-zero"));
        }
        if self.output_filename.trim().is_empty() {
            return Err(ScenecastError::validation("output filename must be non-empty"));
        }
        if self.output_filename.contains(['/', '\\']) {
            return Err(ScenecastError::validation(
                "output filename must not contain path separators",
            ));
        }
        if self.start_frame > self.end_frame {
            return Err(ScenecastError::validation(
                "start frame must be <= end frame",
            ));
        }
        self.range()?;
        Ok(())
    }

    /// Exported frames as a half-open range.
    pub fn range(&self) -> ScenecastResult<FrameRange> {
        FrameRange::from_inclusive(self.start_frame, self.end_frame)
    }

    /// Final output path `<output_dir>/<output_filename>.<ext>`.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_filename, self.format.extension()))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
