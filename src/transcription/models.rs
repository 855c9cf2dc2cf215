//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A complete transcript: ordered segments plus the flattened text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcript text.
    pub text: String,
    /// Total duration in seconds (end of the last segment).
    pub duration: f64,
    /// Individual transcript segments with timestamps, ordered by start.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Create a transcript from segments, flattening their text.
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        let text = segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self::with_text(text, segments)
    }

    /// Create a transcript keeping the full text reported by the service.
    pub fn with_text(text: String, mut segments: Vec<TranscriptSegment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));

        let duration = segments
            .iter()
            .map(|s| s.end)
            .fold(0.0_f64, f64::max);

        Self {
            text,
            duration,
            segments,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Text of every segment that overlaps `[start, end)`.
    pub fn text_between(&self, start: f64, end: f64) -> String {
        self.segments
            .iter()
            .filter(|s| s.start < end && s.end > start)
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// One `[start - end] text` line per segment, times in seconds.
    pub fn format_with_seconds(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("[{:.2} - {:.2}] {}", s.start, s.end, s.text.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// A segment that can carry captions: positive length and some text.
    pub fn is_speakable(&self) -> bool {
        self.start < self.end && !self.text.trim().is_empty()
    }
}
