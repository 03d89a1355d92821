use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::foundation::cancel::CancelToken;
use crate::foundation::error::{ScenecastError, ScenecastResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One `ffmpeg` invocation belonging to a named export stage.
///
/// `-y -loglevel error` are always prepended; the stage name is carried into every error so a
/// failed export names what broke.
#[derive(Clone, Debug)]
pub struct FfmpegCommand {
    stage: String,
    args: Vec<OsString>,
}

impl FfmpegCommand {
    /// Empty command for `stage`.
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            args: Vec::new(),
        }
    }

    /// Stage name used in logs and errors.
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Append `-i <path>`.
    pub fn input(self, path: &Path) -> Self {
        self.arg("-i").arg(path)
    }

    /// Arguments after the fixed prefix, lossily converted for inspection.
    pub fn to_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Run to completion. A raised `cancel` kills the process and returns
    /// [`ScenecastError::Cancelled`]; partial outputs are left in place.
    pub fn run(&self, cancel: &CancelToken) -> ScenecastResult<()> {
        cancel.check()?;
        tracing::debug!(stage = %self.stage, args = ?self.to_args(), "running ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error"])
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ScenecastError::export(format!(
                    "{}: failed to spawn ffmpeg (is it installed and on PATH?): {e}",
                    self.stage
                ))
            })?;

        let mut stderr = child.stderr.take().ok_or_else(|| {
            ScenecastError::export(format!("{}: failed to open ffmpeg stderr", self.stage))
        })?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok::<_, std::io::Error>(stderr_bytes)
        });

        let status = loop {
            if cancel.is_cancelled() {
                tracing::info!(stage = %self.stage, "cancelling ffmpeg");
                let _ = child.kill();
                let _ = child.wait();
                let _ = stderr_drain.join();
                return Err(ScenecastError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(ScenecastError::export(format!(
                        "{}: failed to wait for ffmpeg: {e}",
                        self.stage
                    )));
                }
            }
        };

        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| ScenecastError::export("ffmpeg stderr drain thread panicked"))?
            .map_err(|e| ScenecastError::export(format!("ffmpeg stderr read failed: {e}")))?;

        if !status.success() {
            return Err(ScenecastError::export(format!(
                "{}: ffmpeg exited with status {}: {}",
                self.stage,
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ScenecastResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}
