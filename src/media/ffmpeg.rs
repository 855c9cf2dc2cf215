//! ffmpeg/ffprobe backed [`MediaTools`] implementation.

use super::command::{run_tool, stderr_tail};
use super::{MediaInfo, MediaTools, RenderJob};
use crate::config::{ClipEncoding, Settings};
use crate::error::{CorteError, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Media tools backed by the ffmpeg command-line programs.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: String,
    ffprobe: String,
    audio_bitrate: String,
    clip_encoding: ClipEncoding,
}

impl Ffmpeg {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ffmpeg: settings.tools.ffmpeg.clone(),
            ffprobe: settings.tools.ffprobe.clone(),
            audio_bitrate: settings.transcription.audio_bitrate.clone(),
            clip_encoding: settings.clips.encoding,
        }
    }

    /// Run ffmpeg and require both a zero exit and a non-empty output file.
    async fn transcode(&self, args: Vec<OsString>, dest: &Path, what: &str) -> Result<()> {
        let output = run_tool(&self.ffmpeg, args).await?;

        if !output.status.success() {
            return Err(CorteError::TranscodeFailed(format!(
                "{} exited with {}: {}",
                what,
                output.status,
                stderr_tail(&output)
            )));
        }

        let size = std::fs::metadata(dest).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(CorteError::TranscodeFailed(format!(
                "{} produced no output at {}",
                what,
                dest.display()
            )));
        }

        Ok(())
    }
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(json: &str) -> Result<MediaInfo> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| CorteError::TranscodeFailed(format!("Invalid ffprobe output: {e}")))?;

    let duration_seconds = match &parsed["format"]["duration"] {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|d| d.is_finite() && *d >= 0.0)
    .ok_or_else(|| CorteError::TranscodeFailed("Could not determine media duration".into()))?;

    let video_stream = parsed["streams"].as_array().and_then(|streams| {
        streams
            .iter()
            .find(|s| s["codec_type"].as_str() == Some("video"))
    });

    let dimension = |key: &str| {
        video_stream
            .and_then(|s| s[key].as_u64())
            .and_then(|v| u32::try_from(v).ok())
    };

    Ok(MediaInfo {
        duration_seconds,
        width: dimension("width"),
        height: dimension("height"),
    })
}

fn os_args<const N: usize>(args: [&str; N]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

#[async_trait]
impl MediaTools for Ffmpeg {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let mut args = os_args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"]);
        args.push(path.into());

        let output = run_tool(&self.ffprobe, args).await?;
        if !output.status.success() {
            return Err(CorteError::TranscodeFailed(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                stderr_tail(&output)
            )));
        }

        let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed {}: {:?}", path.display(), info);
        Ok(info)
    }

    #[instrument(skip(self), fields(video = %video.display()))]
    async fn extract_audio(&self, video: &Path, dest: &Path) -> Result<()> {
        info!("Extracting audio track");

        let mut args = os_args(["-y", "-loglevel", "error", "-i"]);
        args.push(video.into());
        args.extend(os_args(["-vn", "-ac", "1", "-ar", "16000", "-codec:a", "libmp3lame", "-b:a"]));
        args.push(self.audio_bitrate.as_str().into());
        args.push(dest.into());

        self.transcode(args, dest, "audio extraction").await
    }

    #[instrument(skip_all, fields(output = %job.output.display()))]
    async fn render(&self, job: &RenderJob) -> Result<()> {
        info!("Rendering captioned vertical video");

        let mut args = os_args(["-y", "-loglevel", "error", "-i"]);
        args.push(job.input.as_os_str().into());
        args.push("-vf".into());
        args.push(job.video_filter.as_str().into());
        args.extend(os_args([
            "-c:v", "libx264", "-preset", "fast", "-crf", "23",
            "-c:a", "aac", "-b:a", "128k",
            "-movflags", "+faststart",
        ]));
        args.push(job.output.as_os_str().into());

        self.transcode(args, &job.output, "caption render").await
    }

    async fn cut(&self, source: &Path, start: f64, end: f64, dest: &Path) -> Result<()> {
        let mut args = os_args(["-y", "-loglevel", "error", "-ss"]);
        args.push(format!("{:.3}", start).into());
        args.push("-i".into());
        args.push(source.into());
        args.push("-t".into());
        args.push(format!("{:.3}", end - start).into());

        match self.clip_encoding {
            ClipEncoding::Reencode => args.extend(os_args([
                "-c:v", "libx264", "-preset", "fast", "-crf", "23",
                "-c:a", "aac", "-b:a", "128k",
                "-movflags", "+faststart",
            ])),
            ClipEncoding::Copy => {
                args.extend(os_args(["-c", "copy", "-avoid_negative_ts", "make_zero"]))
            }
        }
        args.push(dest.into());

        self.transcode(args, dest, "clip cut").await
    }
}
