//! Media probing and transcoding.
//!
//! All ffmpeg/ffprobe work goes through the [`MediaTools`] trait so the
//! pipeline stages can be exercised without the real binaries.

mod command;
mod ffmpeg;

pub use command::{run_tool, stderr_tail};
pub use ffmpeg::{parse_probe_output, Ffmpeg};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Facts about a media file, as reported by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Container duration in seconds.
    pub duration_seconds: f64,
    /// Width of the first video stream, if any.
    pub width: Option<u32>,
    /// Height of the first video stream, if any.
    pub height: Option<u32>,
}

impl MediaInfo {
    /// Frame size, when the file has a video stream.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// A single transcode of the source into the captioned vertical master.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Complete `-vf` filter chain (reframe followed by captions).
    pub video_filter: String,
}

/// Media operations used by the pipeline.
#[async_trait]
pub trait MediaTools: Send + Sync {
    /// Probe duration and frame size.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Extract the audio track to a compressed file for speech-to-text.
    async fn extract_audio(&self, video: &Path, dest: &Path) -> Result<()>;

    /// Transcode `job.input` into `job.output` through `job.video_filter`.
    async fn render(&self, job: &RenderJob) -> Result<()>;

    /// Cut `[start, end)` of `source` into `dest`.
    async fn cut(&self, source: &Path, start: f64, end: f64, dest: &Path) -> Result<()>;
}
