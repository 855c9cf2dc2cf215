//! Clip extraction from the captioned master.

use crate::config::ClipSettings;
use crate::error::{CorteError, Result};
use crate::highlights::Highlight;
use crate::media::MediaTools;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// One extracted clip and the window it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub ordinal: usize,
    pub source_window: Highlight,
    pub output_path: PathBuf,
}

/// A highlight that could not be extracted.
#[derive(Debug)]
pub struct ClipFailure {
    pub ordinal: usize,
    pub window: Highlight,
    pub error: CorteError,
}

/// Result of extracting every highlight.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub clips: Vec<Clip>,
    pub failures: Vec<ClipFailure>,
}

impl ExtractionReport {
    pub fn attempted(&self) -> usize {
        self.clips.len() + self.failures.len()
    }
}

/// `clip_{ordinal:02}_{start}s_{end}s.mp4` with whole-second bounds.
pub fn clip_file_name(ordinal: usize, start: f64, end: f64) -> String {
    format!(
        "clip_{:02}_{}s_{}s.mp4",
        ordinal,
        start.round() as i64,
        end.round() as i64
    )
}

/// Cuts highlight windows out of a master video.
pub struct ClipExtractor {
    media: Arc<dyn MediaTools>,
    tolerance: f64,
}

impl ClipExtractor {
    pub fn new(media: Arc<dyn MediaTools>, settings: &ClipSettings) -> Self {
        Self {
            media,
            tolerance: settings.duration_tolerance_seconds.max(0.0),
        }
    }

    /// Extract one clip per highlight into `clips_dir`.
    ///
    /// Out-of-range windows are recorded in the report and skipped. A
    /// transcoder failure aborts the whole extraction.
    #[instrument(skip(self, highlights), fields(master = %master.display(), highlights = highlights.len()))]
    pub async fn extract(
        &self,
        master: &Path,
        highlights: &[Highlight],
        clips_dir: &Path,
    ) -> Result<ExtractionReport> {
        tokio::fs::create_dir_all(clips_dir).await?;

        let duration = self.media.probe(master).await?.duration_seconds;
        info!("Master duration {:.2}s, extracting {} clips", duration, highlights.len());

        let mut report = ExtractionReport::default();

        for (i, window) in highlights.iter().enumerate() {
            let ordinal = i + 1;

            if !self.fits(window, duration) {
                let error = CorteError::ClipOutOfRange {
                    start: window.start,
                    end: window.end,
                    duration,
                };
                warn!("Skipping clip {}: {}", ordinal, error);
                report.failures.push(ClipFailure {
                    ordinal,
                    window: window.clone(),
                    error,
                });
                continue;
            }

            let end = window.end.min(duration);
            let output_path = clips_dir.join(clip_file_name(ordinal, window.start, window.end));
            self.media.cut(master, window.start, end, &output_path).await?;

            info!("Clip {} written to {}", ordinal, output_path.display());
            report.clips.push(Clip {
                ordinal,
                source_window: window.clone(),
                output_path,
            });
        }

        Ok(report)
    }

    /// The selector's shape checks, repeated for windows read from
    /// `highlights.json`, plus the master's real length.
    fn fits(&self, window: &Highlight, duration: f64) -> bool {
        window.start.is_finite()
            && window.end.is_finite()
            && window.start >= 0.0
            && window.start < window.end
            && window.start < duration
            && window.end <= duration + self.tolerance
    }
}
