use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::assets::probe::probe_media;
use crate::encode::sink::FrameRGBA;
use crate::foundation::core::Fps;
use crate::foundation::error::{ScenecastError, ScenecastResult};

/// Pulls still frames out of a video source at arbitrary times.
pub trait FrameExtractor {
    /// Source this extractor decodes.
    fn src(&self) -> &str;
    /// Frame presented at `secs` into the source.
    fn frame_at(&mut self, secs: f64) -> ScenecastResult<FrameRGBA>;
}

impl<E: FrameExtractor + ?Sized> FrameExtractor for Box<E> {
    fn src(&self) -> &str {
        (**self).src()
    }

    fn frame_at(&mut self, secs: f64) -> ScenecastResult<FrameRGBA> {
        (**self).frame_at(secs)
    }
}

fn probe_dimensions(src: &str) -> ScenecastResult<(u32, u32)> {
    let probe = probe_media(Path::new(src))?;
    match (probe.width, probe.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ScenecastError::media(format!("no video stream found in '{src}'"))),
    }
}

/// Out-of-process extraction: one `ffmpeg` seek-and-decode per requested frame.
#[derive(Clone, Debug)]
pub struct FfmpegFrameExtractor {
    src: String,
    width: u32,
    height: u32,
}

impl FfmpegFrameExtractor {
    /// Probe `src` and prepare the extractor.
    pub fn new(src: impl Into<String>) -> ScenecastResult<Self> {
        let src = src.into();
        let (width, height) = probe_dimensions(&src)?;
        Ok(Self { src, width, height })
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn src(&self) -> &str {
        &self.src
    }

    fn frame_at(&mut self, secs: f64) -> ScenecastResult<FrameRGBA> {
        let out = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{:.9}", secs.max(0.0))])
            .arg("-i")
            .arg(&self.src)
            .args([
                "-frames:v",
                "1",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .output()
            .map_err(|e| {
                ScenecastError::export(format!("failed to run ffmpeg for frame extraction: {e}"))
            })?;

        if !out.status.success() {
            return Err(ScenecastError::export(format!(
                "ffmpeg frame extraction failed for '{}': {}",
                self.src,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let expected_len = FrameRGBA::expected_len(self.width, self.height);
        if out.stdout.len() < expected_len {
            return Err(ScenecastError::export(format!(
                "ffmpeg returned {} bytes for '{}' at {secs:.3}s, expected {expected_len}",
                out.stdout.len(),
                self.src
            )));
        }
        let mut data = out.stdout;
        data.truncate(expected_len);
        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: false,
        })
    }
}

struct DecodeSession {
    child: Child,
    stdout: ChildStdout,
    start_secs: f64,
    next_index: u64,
}

impl Drop for DecodeSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// In-process style extraction: one long-lived decode session read forward frame by frame.
///
/// The session decodes at the scene frame rate, so moving forward by one scene frame costs one
/// frame read. Backward jumps, or forward jumps beyond `max_skip_frames`, restart the session at
/// the requested time.
pub struct SequentialFrameExtractor {
    src: String,
    width: u32,
    height: u32,
    fps: Fps,
    max_skip_frames: u64,
    session: Option<DecodeSession>,
    last: Option<(u64, FrameRGBA)>,
    restarts: u32,
}

impl SequentialFrameExtractor {
    /// Probe `src` and prepare a session decoding at `fps`.
    pub fn new(src: impl Into<String>, fps: Fps) -> ScenecastResult<Self> {
        let src = src.into();
        let (width, height) = probe_dimensions(&src)?;
        Ok(Self {
            src,
            width,
            height,
            fps,
            max_skip_frames: u64::from(fps.num.div_ceil(fps.den.max(1))) * 2,
            session: None,
            last: None,
            restarts: 0,
        })
    }

    /// Number of decode sessions started so far.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    fn start(&mut self, secs: f64) -> ScenecastResult<()> {
        self.session = None;
        // Keep the previous frame as the end-of-stream fallback, but never as a cache hit.
        self.last = self.last.take().map(|(_, f)| (u64::MAX, f));
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{:.9}", secs.max(0.0))])
            .arg("-i")
            .arg(&self.src)
            .args([
                "-an",
                "-vf",
                &format!("fps={}/{}", self.fps.num, self.fps.den),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ScenecastError::export(format!("failed to spawn ffmpeg decode session: {e}"))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScenecastError::export("failed to open ffmpeg stdout (unexpected)"))?;
        tracing::debug!(src = %self.src, start = secs, "decode session started");
        self.restarts += 1;
        self.session = Some(DecodeSession {
            child,
            stdout,
            start_secs: secs.max(0.0),
            next_index: 0,
        });
        Ok(())
    }

    fn read_next(&mut self) -> ScenecastResult<Option<FrameRGBA>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let mut data = vec![0u8; FrameRGBA::expected_len(self.width, self.height)];
        match session.stdout.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(ScenecastError::export(format!(
                    "decode session read failed for '{}': {e}",
                    self.src
                )));
            }
        }
        session.next_index += 1;
        Ok(Some(FrameRGBA {
            width: self.width,
            height: self.height,
            data,
            premultiplied: false,
        }))
    }

    fn target_index(&self, secs: f64) -> Option<u64> {
        let session = self.session.as_ref()?;
        let offset = (secs - session.start_secs) * self.fps.as_f64();
        (offset >= -1e-6).then(|| offset.round().max(0.0) as u64)
    }
}

impl FrameExtractor for SequentialFrameExtractor {
    fn src(&self) -> &str {
        &self.src
    }

    fn frame_at(&mut self, secs: f64) -> ScenecastResult<FrameRGBA> {
        let mut target = self.target_index(secs);
        if let (Some(t), Some((last, frame))) = (target, self.last.as_ref())
            && t == *last
        {
            return Ok(frame.clone());
        }

        let next = self.session.as_ref().map_or(0, |s| s.next_index);
        let restart = match target {
            None => true,
            Some(t) => t < next || t - next > self.max_skip_frames,
        };
        if restart {
            self.start(secs)?;
            target = Some(0);
        }
        let target = target.unwrap_or(0);

        loop {
            match self.read_next()? {
                Some(frame) => {
                    let idx = self.session.as_ref().map_or(0, |s| s.next_index - 1);
                    if idx >= target {
                        self.last = Some((idx, frame.clone()));
                        return Ok(frame);
                    }
                }
                None => {
                    // Past the end of the stream the last decoded frame stays on screen.
                    return self.last.as_ref().map(|(_, f)| f.clone()).ok_or_else(|| {
                        ScenecastError::export(format!(
                            "no frame available in '{}' at {secs:.3}s",
                            self.src
                        ))
                    });
                }
            }
        }
    }
}

/// Remembers the last produced frame, keyed by the exact requested time.
pub struct CachedExtractor<E> {
    inner: E,
    last: Option<(u64, FrameRGBA)>,
    decodes: u32,
}

impl<E: FrameExtractor> CachedExtractor<E> {
    /// Wrap `inner`.
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            last: None,
            decodes: 0,
        }
    }

    /// Number of requests that reached the inner extractor.
    pub fn decodes(&self) -> u32 {
        self.decodes
    }

    /// Wrapped extractor.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: FrameExtractor> FrameExtractor for CachedExtractor<E> {
    fn src(&self) -> &str {
        self.inner.src()
    }

    fn frame_at(&mut self, secs: f64) -> ScenecastResult<FrameRGBA> {
        let key = secs.to_bits();
        if let Some((cached, frame)) = self.last.as_ref()
            && *cached == key
        {
            return Ok(frame.clone());
        }
        self.decodes += 1;
        let frame = self.inner.frame_at(secs)?;
        self.last = Some((key, frame.clone()));
        Ok(frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/extract.rs"]
mod tests;
