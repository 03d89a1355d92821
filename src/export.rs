use std::path::{Path, PathBuf};

use crate::audio::render::{AudioJob, generate_audio, merge_media};
use crate::audio::timeline::{AssetFrameRecord, MediaAsset, extract_media_assets};
use crate::config::ExportSettings;
use crate::encode::visuals::VisualTrackSink;
use crate::foundation::cancel::CancelToken;
use crate::foundation::error::ScenecastResult;
use crate::media::collect::AssetCollector;

/// Suffix marking a temp dir as auto-generated and safe to remove after a merge.
pub const TEMP_DIR_SENTINEL: &str = ".scenecast-tmp";

/// Working directory of an export job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TempDir {
    /// Created by the exporter; removed after a successful merge.
    Auto(PathBuf),
    /// Supplied by the caller; never removed.
    User(PathBuf),
}

impl TempDir {
    /// Fresh auto-generated directory under the system temp dir.
    pub fn auto() -> Self {
        Self::auto_in(&std::env::temp_dir())
    }

    /// Fresh auto-generated directory under `parent`.
    pub fn auto_in(parent: &Path) -> Self {
        Self::Auto(parent.join(format!("{}{TEMP_DIR_SENTINEL}", uuid::Uuid::new_v4())))
    }

    /// `user` when given, otherwise a fresh auto-generated directory.
    pub fn resolve(user: Option<PathBuf>) -> Self {
        match user {
            Some(path) => Self::User(path),
            None => Self::auto(),
        }
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Auto(p) | Self::User(p) => p,
        }
    }

    /// `true` for [`TempDir::Auto`].
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto(_))
    }

    /// `true` when `path`'s final component carries [`TEMP_DIR_SENTINEL`].
    pub fn is_auto_generated(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.len() > TEMP_DIR_SENTINEL.len() && n.ends_with(TEMP_DIR_SENTINEL))
    }
}

/// One export job: collects per-frame asset snapshots, then builds the audio track and merges it
/// with the visual track rendered through [`ExportSession::visual_sink`].
pub struct ExportSession {
    settings: ExportSettings,
    temp_dir: TempDir,
    frames: Vec<Vec<AssetFrameRecord>>,
    cancel: CancelToken,
}

impl ExportSession {
    /// Validate `settings` and resolve the temp dir.
    pub fn new(settings: ExportSettings) -> ScenecastResult<Self> {
        settings.validate()?;
        let temp_dir = TempDir::resolve(settings.temp_dir.clone());
        tracing::debug!(
            temp_dir = %temp_dir.path().display(),
            auto = temp_dir.is_auto(),
            "export session created"
        );
        Ok(Self {
            settings,
            temp_dir,
            frames: Vec::new(),
            cancel: CancelToken::new(),
        })
    }

    /// Observe `cancel` instead of the session's own token.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Job settings.
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Working directory.
    pub fn temp_dir(&self) -> &TempDir {
        &self.temp_dir
    }

    /// Token cancelling this job.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Sink writing the visual intermediate into the temp dir.
    pub fn visual_sink(&self) -> VisualTrackSink {
        VisualTrackSink::new(self.temp_dir.path(), self.settings.format)
    }

    /// Append the snapshot of the next exported frame.
    pub fn push_frame(&mut self, records: &[AssetFrameRecord]) {
        self.frames.push(records.to_vec());
    }

    /// Move every finished snapshot out of `collector`.
    pub fn collect(&mut self, collector: &mut AssetCollector) {
        self.frames.extend(collector.take_frames());
    }

    /// Snapshots gathered so far.
    pub fn frames(&self) -> &[Vec<AssetFrameRecord>] {
        &self.frames
    }

    /// Asset placements reconstructed from the snapshots.
    pub fn assets(&self) -> Vec<MediaAsset> {
        extract_media_assets(&self.frames, self.settings.fps)
    }

    /// Audio job for the current snapshots.
    pub fn audio_job(&self) -> AudioJob {
        AudioJob {
            output_dir: self.settings.output_dir.clone(),
            temp_dir: self.temp_dir.path().to_path_buf(),
            assets: self.assets(),
            start_frame: self.settings.start_frame,
            end_frame: self.settings.end_frame,
            fps: self.settings.fps,
        }
    }

    /// Build the audio track and write the final output. Returns its path.
    #[tracing::instrument(skip_all, fields(output = %self.settings.output_filename))]
    pub fn finish(self) -> ScenecastResult<PathBuf> {
        let expected = self.settings.range()?.len_frames();
        if self.frames.len() as u64 != expected {
            tracing::warn!(
                collected = self.frames.len(),
                expected,
                "frame snapshot count differs from the exported range"
            );
        }
        let job = self.audio_job();
        let tracks = generate_audio(&job, &self.cancel)?;
        tracing::info!(tracks = tracks.len(), "audio generated");
        merge_media(
            &self.settings.output_filename,
            &self.settings.output_dir,
            self.temp_dir.path(),
            self.settings.format,
            &self.cancel,
        )
    }
}

#[cfg(test)]
#[path = "../tests/unit/export.rs"]
mod tests;
