//! Per-run working directory and artifact layout.

use crate::acquisition::find_downloaded_video;
use crate::error::{CorteError, Result};
use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One end-to-end run, scoped to its own directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub work_dir: PathBuf,
    /// Identifier the run was started with. Unknown for a reopened session.
    pub source: Option<String>,
    /// Local video, once acquired.
    pub video: Option<PathBuf>,
    /// Probed duration of `video` in seconds.
    pub video_duration: Option<f64>,
}

impl Session {
    /// Create a fresh `YYYYMMDD_HHMMSS` directory under `output_dir`.
    ///
    /// A run started within the same second gets a `_N` suffix.
    pub fn create(output_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        let output_dir = output_dir.canonicalize()?;
        let base = Local::now().format("%Y%m%d_%H%M%S").to_string();

        for n in 0..1000 {
            let id = if n == 0 { base.clone() } else { format!("{}_{}", base, n) };
            let work_dir = output_dir.join(&id);

            match std::fs::create_dir(&work_dir) {
                Ok(()) => {
                    debug!("Created session directory {}", work_dir.display());
                    return Ok(Self {
                        id,
                        work_dir,
                        source: None,
                        video: None,
                        video_duration: None,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(CorteError::Config(format!(
            "Could not allocate a session directory under {}",
            output_dir.display()
        )))
    }

    /// Reopen an existing session directory, picking up its video if present.
    pub fn open(work_dir: &Path) -> Result<Self> {
        if !work_dir.is_dir() {
            return Err(CorteError::InvalidInput(format!(
                "{} is not a session directory",
                work_dir.display()
            )));
        }
        let work_dir = work_dir.canonicalize()?;
        let id = work_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let video = find_downloaded_video(&work_dir).ok();
        Ok(Self {
            id,
            work_dir,
            source: None,
            video,
            video_duration: None,
        })
    }

    pub fn audio_path(&self) -> PathBuf {
        self.work_dir.join("audio.mp3")
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.work_dir.join("transcript.json")
    }

    pub fn subtitles_path(&self) -> PathBuf {
        self.work_dir.join("subtitles.srt")
    }

    pub fn captions_path(&self) -> PathBuf {
        self.work_dir.join("captions.ass")
    }

    pub fn highlights_path(&self) -> PathBuf {
        self.work_dir.join("highlights.json")
    }

    pub fn captioned_video_path(&self) -> PathBuf {
        self.work_dir.join("video_captioned.mp4")
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.work_dir.join("clips")
    }
}
