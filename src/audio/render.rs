use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::assets::probe::probe_media;
use crate::assets::source::sanitize_file_stem;
use crate::audio::filters::{IsolationPlan, plan_isolation};
use crate::audio::timeline::MediaAsset;
use crate::encode::format::OutputFormat;
use crate::encode::process::{FfmpegCommand, ensure_parent_dir};
use crate::encode::visuals::visuals_path;
use crate::export::TempDir;
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Fps, FrameRange, MediaKind};
use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Sample rate of every intermediate audio file.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Channel count of every intermediate audio file.
pub const MIX_CHANNELS: u16 = 2;
/// File name of the mixed track inside the temp dir.
pub const MIX_FILE_NAME: &str = "audio.wav";

/// Inputs of one audio export.
#[derive(Clone, Debug)]
pub struct AudioJob {
    /// Directory the final output goes to.
    pub output_dir: PathBuf,
    /// Working directory for intermediates.
    pub temp_dir: PathBuf,
    /// Placed assets, usually from [`crate::extract_media_assets`].
    pub assets: Vec<MediaAsset>,
    /// First exported frame (inclusive).
    pub start_frame: u64,
    /// Last exported frame (inclusive).
    pub end_frame: u64,
    /// Scene frame rate.
    pub fps: Fps,
}

fn pcm_output_args() -> [String; 6] {
    [
        "-ac".to_string(),
        MIX_CHANNELS.to_string(),
        "-ar".to_string(),
        MIX_SAMPLE_RATE.to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
    ]
}

// Native sample rate of the asset's audio, or `None` when it has no audio stream.
fn audio_sample_rate(asset: &MediaAsset) -> ScenecastResult<Option<u32>> {
    match probe_media(Path::new(&asset.src)) {
        Ok(probe) if asset.kind == MediaKind::Video && !probe.has_audio => Ok(None),
        Ok(probe) => Ok(Some(probe.sample_rate.unwrap_or(MIX_SAMPLE_RATE))),
        Err(e) if asset.kind == MediaKind::Audio => {
            tracing::warn!(key = %asset.key, error = %e, "audio probe failed, assuming 48 kHz");
            Ok(Some(MIX_SAMPLE_RATE))
        }
        Err(e) => Err(ScenecastError::export(format!(
            "probe of '{}' ({}) failed: {e}",
            asset.key, asset.src
        ))),
    }
}

// File stem for the isolated track of asset `index`, unique within one job and never the mix's.
pub(crate) fn track_stem(key: &str, index: usize, taken: &mut HashSet<String>) -> String {
    if taken.is_empty() {
        taken.insert(MIX_FILE_NAME.trim_end_matches(".wav").to_string());
    }
    let mut stem = sanitize_file_stem(key);
    while !taken.insert(stem.clone()) {
        stem = format!("{stem}-{index}");
    }
    stem
}

pub(crate) fn isolation_command(
    asset: &MediaAsset,
    plan: &IsolationPlan,
    out: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(format!("isolate audio of '{}'", asset.key))
        .arg("-i")
        .arg(&asset.src)
        .args(["-vn", "-af"])
        .arg(plan.filter_chain())
        .args(pcm_output_args())
        .arg(out)
}

pub(crate) fn mix_command(inputs: &[PathBuf], out: &Path) -> FfmpegCommand {
    let n = inputs.len();
    inputs
        .iter()
        .fold(FfmpegCommand::new("mix audio tracks"), |cmd, p| cmd.input(p))
        .arg("-filter_complex")
        .arg(format!("amix=inputs={n}:duration=longest,volume={n}"))
        .args(pcm_output_args())
        .arg(out)
}

pub(crate) fn mux_command(
    visuals: &Path,
    audio: &Path,
    format: OutputFormat,
    out: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new("mux audio with visuals")
        .input(visuals)
        .input(audio)
        .args([
            "-map",
            "0:v",
            "-map",
            "1:a",
            "-c:v",
            "copy",
            "-c:a",
            format.audio_codec(),
            "-shortest",
        ])
        .arg(out)
}

/// Isolate every audible asset into `<temp_dir>/<key>.wav`, then mix them into
/// `<temp_dir>/audio.wav`.
///
/// Assets with a zero rate, zero volume or no audio stream are skipped. Assets are processed one at
/// a time; the first failure aborts the job. Returns the per-asset files in asset order.
///
/// A mix left in the temp dir by an earlier job is removed first, so a job without audible assets
/// never leaves an `audio.wav` behind.
#[tracing::instrument(skip_all, fields(assets = job.assets.len(), temp_dir = %job.temp_dir.display()))]
pub fn generate_audio(job: &AudioJob, cancel: &CancelToken) -> ScenecastResult<Vec<PathBuf>> {
    let range = FrameRange::from_inclusive(job.start_frame, job.end_frame)?;
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(&job.temp_dir)
            .with_context(|| format!("create temp dir '{}'", job.temp_dir.display()))?;
        std::fs::create_dir_all(&job.output_dir)
            .with_context(|| format!("create output dir '{}'", job.output_dir.display()))?;
    }
    let mix = job.temp_dir.join(MIX_FILE_NAME);
    if mix.is_file() {
        tracing::debug!(path = %mix.display(), "removing stale mix");
        std::fs::remove_file(&mix).map_err(|e| {
            ScenecastError::export(format!("remove stale mix '{}': {e}", mix.display()))
        })?;
    }

    let mut outputs = Vec::new();
    let mut taken = HashSet::new();
    for (index, asset) in job.assets.iter().enumerate() {
        cancel.check()?;
        if asset.playback_rate <= 0.0 || asset.volume <= 0.0 {
            tracing::debug!(key = %asset.key, "skipping silent asset");
            continue;
        }
        let Some(sample_rate) = audio_sample_rate(asset)? else {
            tracing::debug!(key = %asset.key, "skipping asset without audio stream");
            continue;
        };

        let plan = plan_isolation(asset, range, job.fps, sample_rate);
        let out = job
            .temp_dir
            .join(format!("{}.wav", track_stem(&asset.key, index, &mut taken)));
        tracing::info!(key = %asset.key, chain = %plan.filter_chain(), "isolating asset audio");
        isolation_command(asset, &plan, &out).run(cancel)?;
        outputs.push(out);
    }

    if !outputs.is_empty() {
        mix_tracks(&outputs, &mix, cancel)?;
    }
    Ok(outputs)
}

/// Mix `inputs` with equal weight into `out`, then undo the mix-down attenuation with a gain equal
/// to the track count.
pub fn mix_tracks(inputs: &[PathBuf], out: &Path, cancel: &CancelToken) -> ScenecastResult<()> {
    if inputs.is_empty() {
        return Err(ScenecastError::validation("mix needs at least one track"));
    }
    tracing::info!(tracks = inputs.len(), out = %out.display(), "mixing audio tracks");
    mix_command(inputs, out).run(cancel)
}

/// Produce `<output_dir>/<output_filename>.<ext>` from the intermediates in `temp_dir`.
///
/// With a mixed `audio.wav` present, the visual track is copied and the audio encoded for
/// `format`; otherwise the visual track is copied byte for byte. Auto-generated temp dirs are
/// removed afterwards, user-supplied ones are left alone.
#[tracing::instrument(skip(cancel), fields(output_dir = %output_dir.display(), temp_dir = %temp_dir.display()))]
pub fn merge_media(
    output_filename: &str,
    output_dir: &Path,
    temp_dir: &Path,
    format: OutputFormat,
    cancel: &CancelToken,
) -> ScenecastResult<PathBuf> {
    cancel.check()?;
    let visuals = visuals_path(temp_dir, format);
    if !visuals.is_file() {
        return Err(ScenecastError::export(format!(
            "merge: visual track '{}' is missing",
            visuals.display()
        )));
    }
    let out = output_dir.join(format!("{output_filename}.{}", format.extension()));
    ensure_parent_dir(&out)?;

    let audio = temp_dir.join(MIX_FILE_NAME);
    if audio.is_file() {
        mux_command(&visuals, &audio, format, &out).run(cancel)?;
    } else {
        tracing::info!("no audio track, copying visuals");
        std::fs::copy(&visuals, &out).map_err(|e| {
            ScenecastError::export(format!(
                "merge: copy '{}' to '{}' failed: {e}",
                visuals.display(),
                out.display()
            ))
        })?;
    }

    if TempDir::is_auto_generated(temp_dir)
        && let Err(e) = std::fs::remove_dir_all(temp_dir)
    {
        tracing::warn!(temp_dir = %temp_dir.display(), error = %e, "temp dir cleanup failed");
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/render.rs"]
mod tests;
