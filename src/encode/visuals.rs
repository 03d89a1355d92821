use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::format::OutputFormat;
use crate::encode::process::{ensure_parent_dir, is_ffmpeg_on_path};
use crate::encode::sink::{FrameRGBA, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ScenecastError, ScenecastResult};

/// File stem of the visual-track intermediate.
pub const VISUALS_FILE_STEM: &str = "visuals";

/// Sink that spawns the system `ffmpeg` and streams raw frames into `visuals.<ext>`.
///
/// The track carries no audio; [`crate::merge_media`] muxes the mixed audio later.
pub struct VisualTrackSink {
    out_path: PathBuf,
    format: OutputFormat,
    bg_rgba: [u8; 4],

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl VisualTrackSink {
    /// Sink writing `<dir>/visuals.<ext>` for `format`.
    pub fn new(dir: &Path, format: OutputFormat) -> Self {
        Self {
            out_path: visuals_path(dir, format),
            format,
            bg_rgba: [0, 0, 0, 255],
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Background used to flatten alpha for formats without an alpha channel.
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }

    /// Path of the file being written.
    pub fn path(&self) -> &Path {
        &self.out_path
    }
}

/// Location of the visual-track intermediate inside `dir`.
pub fn visuals_path(dir: &Path, format: OutputFormat) -> PathBuf {
    dir.join(format!("{VISUALS_FILE_STEM}.{}", format.extension()))
}

impl FrameSink for VisualTrackSink {
    fn begin(&mut self, cfg: SinkConfig) -> ScenecastResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ScenecastError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ScenecastError::validation(
                "visual track width/height must be non-zero",
            ));
        }
        if self.format.needs_even_dimensions()
            && (!cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2))
        {
            return Err(ScenecastError::validation(format!(
                "visual track width/height must be even for {}",
                self.format
            )));
        }

        ensure_parent_dir(&self.out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(ScenecastError::export(
                "ffmpeg is required for visual track encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", cfg.width, cfg.height),
            ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args(["-i", "pipe:0", "-an"])
            .args(self.format.video_args())
            .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ScenecastError::export(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScenecastError::export("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ScenecastError::export("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(path = %self.out_path.display(), format = %self.format, "visual track started");
        self.scratch = vec![0u8; FrameRGBA::expected_len(cfg.width, cfg.height)];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ScenecastResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ScenecastError::export("visual track sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ScenecastError::export(
                "visual track sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ScenecastError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ScenecastError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        if self.format.keeps_alpha() {
            to_straight_rgba8(&mut self.scratch, frame);
        } else {
            flatten_over_bg_to_opaque_rgba8(&mut self.scratch, frame, self.bg_rgba);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ScenecastError::export("visual track sink is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ScenecastError::export(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ScenecastResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ScenecastError::export("visual track sink not started"))?;

        let status = child.wait().map_err(|e| {
            ScenecastError::export(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ScenecastError::export("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ScenecastError::export(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(ScenecastError::export(format!(
                "visual track: ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        self.cfg = None;
        Ok(())
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // rawvideo input takes its rate from `-r` before `-i`.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

pub(crate) fn flatten_over_bg_to_opaque_rgba8(dst: &mut [u8], frame: &FrameRGBA, bg_rgba: [u8; 4]) {
    let bg = [bg_rgba[0] as u16, bg_rgba[1] as u16, bg_rgba[2] as u16];

    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        for c in 0..3 {
            let src = if frame.premultiplied {
                s[c] as u16
            } else {
                mul_div255(s[c] as u16, a)
            };
            d[c] = (src + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
}

pub(crate) fn to_straight_rgba8(dst: &mut [u8], frame: &FrameRGBA) {
    if !frame.premultiplied {
        dst.copy_from_slice(&frame.data);
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(frame.data.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 0 {
            d.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for c in 0..3 {
            d[c] = ((s[c] as u16 * 255 + a / 2) / a).min(255) as u8;
        }
        d[3] = s[3];
    }
}

fn mul_div255(x: u16, y: u16) -> u16 {
    let t = x as u32 * y as u32 + 128;
    ((t + (t >> 8)) >> 8) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/encode/visuals.rs"]
mod tests;
