//! Thumbnail generation via an external frame-extraction tool.
//!
//! Generation is synchronous: the call spawns the extractor, blocks until
//! it exits (or a deadline passes), and hands back a [`TempThumbnail`]
//! guard. The guard deletes its file on drop, so a failure on any path
//! between generation and store promotion leaves nothing behind.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempPath;
use thiserror::Error;
use tracing::debug;

use crate::probe::ExtractorKind;

/// How long a hung extractor may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Errors from a single generation attempt.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("extractor exited with status {code:?}")]
    Failed { code: Option<i32> },

    #[error("extractor timed out after {0:?}")]
    TimedOut(Duration),
}

/// A freshly generated preview file, scoped to this value's lifetime.
///
/// Dropping the guard deletes the file. A store promotes it to its final
/// resident path with [`promote`](TempThumbnail::promote); a caller that
/// wants the raw uncached file detaches it with [`keep`](TempThumbnail::keep).
pub struct TempThumbnail {
    path: TempPath,
}

impl TempThumbnail {
    /// Wrap an already-created temp path.
    pub fn new(path: TempPath) -> Self {
        Self { path }
    }

    /// Location of the generated file while the guard is alive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Detach the file from the guard without moving it.
    pub fn keep(self) -> io::Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }

    /// Move the file to `dest`, replacing anything already there.
    ///
    /// Rename first; if the destination is on another filesystem, fall
    /// back to copy and let the guard remove the source. Either way the
    /// temporary file is gone once this returns `Ok`.
    pub(crate) fn promote(self, dest: &Path) -> io::Result<()> {
        match self.path.persist(dest) {
            Ok(()) => Ok(()),
            // Rename fails across filesystems; copy instead and let the
            // guard remove the source.
            Err(err) => {
                let temp = err.path;
                std::fs::copy(&temp, dest).map(|_| ())
            }
        }
    }
}

/// Anything that can turn a source media file into a still image.
///
/// The production implementation is [`FrameExtractor`]; tests substitute
/// a counting fake to observe cache behavior.
pub trait ThumbnailGenerator {
    fn generate(&self, source: &Path) -> Result<TempThumbnail, GeneratorError>;
}

/// Real generator: spawns the probed external tool.
///
/// Must only be constructed for a tool that the startup probe actually
/// found; if no tool is installed the resolver carries no generator at
/// all and this type is never involved.
pub struct FrameExtractor {
    kind: ExtractorKind,
    timeout: Duration,
}

impl FrameExtractor {
    pub fn new(kind: ExtractorKind, timeout: Duration) -> Self {
        Self { kind, timeout }
    }
}

impl ThumbnailGenerator for FrameExtractor {
    fn generate(&self, source: &Path) -> Result<TempThumbnail, GeneratorError> {
        let output = tempfile::Builder::new()
            .prefix("thumbcache-gen-")
            .suffix(".png")
            .tempfile()?
            .into_temp_path();

        let mut child = Command::new(self.kind.program())
            .args(extract_args(self.kind, source, &output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let status = wait_with_deadline(&mut child, self.timeout)?;
        if status.success() {
            debug!(source = %source.display(), tool = self.kind.program(), "frame extracted");
            Ok(TempThumbnail::new(output))
        } else {
            // `output` drops here, discarding any partial frame.
            Err(GeneratorError::Failed {
                code: status.code(),
            })
        }
    }
}

/// Fixed extraction arguments: first representative frame, single output
/// frame, PNG at `output`. Stream output is discarded by the caller, so
/// both tools run in their quiet forms.
fn extract_args(kind: ExtractorKind, source: &Path, output: &Path) -> Vec<OsString> {
    match kind {
        ExtractorKind::Ffmpegthumbnailer => vec![
            OsString::from("-i"),
            source.into(),
            OsString::from("-o"),
            output.into(),
            OsString::from("-s"),
            OsString::from("0"),
            OsString::from("-t"),
            OsString::from("10%"),
        ],
        ExtractorKind::Ffmpeg => vec![
            OsString::from("-y"),
            OsString::from("-loglevel"),
            OsString::from("quiet"),
            OsString::from("-i"),
            source.into(),
            OsString::from("-vf"),
            OsString::from("thumbnail"),
            OsString::from("-frames:v"),
            OsString::from("1"),
            output.into(),
        ],
    }
}

/// Wait for the child, killing it if the deadline passes.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, GeneratorError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(GeneratorError::TimedOut(timeout));
        }
        thread::sleep(WAIT_POLL_INTERVAL);
    }
}
