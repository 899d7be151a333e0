//! Startup capability probe for frame-extraction tools.
//!
//! The probe runs once at process start and its result travels with the
//! configuration rather than living in hidden global state. If no tool is
//! installed, video previews are disabled for the whole process — silently,
//! never as an error surfaced to the rendering path.

use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Known frame-extraction tools, in probe preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// `ffmpegthumbnailer` - purpose-built, preferred when present.
    Ffmpegthumbnailer,
    /// Plain `ffmpeg` fallback.
    Ffmpeg,
}

impl ExtractorKind {
    /// All candidates, in the order they are probed.
    pub const CANDIDATES: [ExtractorKind; 2] = [Self::Ffmpegthumbnailer, Self::Ffmpeg];

    /// Executable name, resolved through the system PATH search.
    pub fn program(&self) -> &'static str {
        match self {
            Self::Ffmpegthumbnailer => "ffmpegthumbnailer",
            Self::Ffmpeg => "ffmpeg",
        }
    }

    /// Arguments for a cheap "are you installed" invocation.
    fn version_args(&self) -> &'static [&'static str] {
        match self {
            Self::Ffmpegthumbnailer => &["-v"],
            Self::Ffmpeg => &["-version"],
        }
    }

    /// Whether this tool responds successfully to its version flag.
    fn available(&self) -> bool {
        Command::new(self.program())
            .args(self.version_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// What the surrounding process can do, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The frame-extraction tool found on this system, if any.
    pub extractor: Option<ExtractorKind>,
}

impl Capabilities {
    /// Probe the system for an installed extractor.
    ///
    /// Tries each candidate with its version flag; the first one that
    /// exits successfully wins. Spawn failures (tool not on PATH) are
    /// treated the same as version-flag failures.
    pub fn probe() -> Self {
        for kind in ExtractorKind::CANDIDATES {
            if kind.available() {
                debug!(tool = kind.program(), "frame extractor detected");
                return Self {
                    extractor: Some(kind),
                };
            }
        }
        debug!("no frame extractor found; video previews disabled");
        Self { extractor: None }
    }

    /// A capabilities value with no extractor, for callers that want
    /// image-only behavior regardless of what is installed.
    pub fn none() -> Self {
        Self { extractor: None }
    }

    /// Whether video previews can be produced at all.
    pub fn video_previews(&self) -> bool {
        self.extractor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_prefer_the_dedicated_tool() {
        assert_eq!(
            ExtractorKind::CANDIDATES[0],
            ExtractorKind::Ffmpegthumbnailer
        );
    }

    #[test]
    fn none_disables_video_previews() {
        assert!(!Capabilities::none().video_previews());
    }
}
