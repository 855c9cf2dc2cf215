//! Highlight selection.
//!
//! The transcript is sent to a text-scoring service, which answers with a
//! JSON list of `{start, end, reason}` windows. Each window is validated,
//! range-checked against the video duration and given the transcript text it
//! covers.

mod parse;
mod scorer;

pub use parse::{parse_windows, ProposedWindow};
pub use scorer::OpenAIScorer;

use crate::config::{HighlightSettings, OutOfRangePolicy, Prompts};
use crate::error::Result;
use crate::retry::{with_backoff, RetryPolicy};
use crate::transcription::Transcript;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const MIN_SEGMENTS: u32 = 3;
const MAX_SEGMENTS: u32 = 6;
const MIN_SECONDS: u32 = 30;
const MAX_SECONDS: u32 = 120;

/// A scored window of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub start: f64,
    pub end: f64,
    /// Always `end - start`.
    pub duration: f64,
    pub reason: String,
    pub transcript_excerpt: String,
}

impl Highlight {
    pub fn new(start: f64, end: f64, reason: impl Into<String>, transcript_excerpt: impl Into<String>) -> Self {
        Self {
            start,
            end,
            duration: end - start,
            reason: reason.into(),
            transcript_excerpt: transcript_excerpt.into(),
        }
    }
}

/// Rendered prompt pair sent to the scoring service.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRequest {
    pub system: String,
    pub user: String,
}

/// A text-scoring backend. Returns the raw model response.
#[async_trait]
pub trait HighlightScorer: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<String>;
}

/// Turns a transcript into validated highlight windows.
pub struct HighlightSelector {
    scorer: Arc<dyn HighlightScorer>,
    prompts: Prompts,
    out_of_range: OutOfRangePolicy,
    retry: RetryPolicy,
}

impl HighlightSelector {
    pub fn new(scorer: Arc<dyn HighlightScorer>, prompts: Prompts, settings: &HighlightSettings) -> Self {
        Self {
            scorer,
            prompts,
            out_of_range: settings.out_of_range,
            retry: settings.retry_policy(),
        }
    }

    /// Render the scoring prompt for a transcript.
    pub fn build_request(&self, transcript: &Transcript, video_duration: f64) -> ScoringRequest {
        let mut vars = HashMap::new();
        vars.insert("duration".to_string(), format!("{:.0}", video_duration));
        vars.insert("min_segments".to_string(), MIN_SEGMENTS.to_string());
        vars.insert("max_segments".to_string(), MAX_SEGMENTS.to_string());
        vars.insert("min_seconds".to_string(), MIN_SECONDS.to_string());
        vars.insert("max_seconds".to_string(), MAX_SECONDS.to_string());
        vars.insert("transcript".to_string(), transcript.format_with_seconds());

        ScoringRequest {
            system: self.prompts.render_with_custom(&self.prompts.highlights.system, &vars),
            user: self.prompts.render_with_custom(&self.prompts.highlights.user, &vars),
        }
    }

    /// Ask the scorer for highlights and keep the windows that fit the video.
    ///
    /// An empty result is not an error.
    #[instrument(skip(self, transcript))]
    pub async fn select(&self, transcript: &Transcript, video_duration: f64) -> Result<Vec<Highlight>> {
        let request = self.build_request(transcript, video_duration);
        let scorer = &self.scorer;
        let request_ref = &request;

        let response = with_backoff(&self.retry, "Highlight scoring", move |_| {
            scorer.score(request_ref)
        })
        .await?;

        let windows = parse_windows(&response)?;
        info!("Scoring service proposed {} windows", windows.len());

        let highlights = self.accept(windows, transcript, video_duration);
        info!("Accepted {} highlights", highlights.len());
        Ok(highlights)
    }

    /// Apply the out-of-range policy and attach transcript excerpts.
    pub fn accept(
        &self,
        windows: Vec<ProposedWindow>,
        transcript: &Transcript,
        video_duration: f64,
    ) -> Vec<Highlight> {
        let mut highlights = Vec::with_capacity(windows.len());

        for window in windows {
            let Some((start, end)) = fit_window(window.start, window.end, video_duration, self.out_of_range) else {
                warn!(
                    "Dropping highlight {:.2}-{:.2}: outside video duration {:.2}s ({} policy)",
                    window.start, window.end, video_duration, self.out_of_range
                );
                continue;
            };

            let highlight = Highlight::new(start, end, window.reason, transcript.text_between(start, end));

            if let Some(stated) = window.stated_duration {
                if (stated - highlight.duration).abs() > 0.01 {
                    warn!(
                        "Ignoring stated duration {:.2}s for {:.2}-{:.2}, using {:.2}s",
                        stated, start, end, highlight.duration
                    );
                }
            }

            debug!("Accepted highlight {:.2}-{:.2}: {}", start, end, highlight.reason);
            highlights.push(highlight);
        }

        highlights
    }
}

/// Bring a window inside `[0, duration]`, or `None` when it must be dropped.
fn fit_window(start: f64, end: f64, duration: f64, policy: OutOfRangePolicy) -> Option<(f64, f64)> {
    let inside = start >= 0.0 && end <= duration;
    let (start, end) = match policy {
        _ if inside => (start, end),
        OutOfRangePolicy::Reject => return None,
        OutOfRangePolicy::Clamp => (start.max(0.0), end.min(duration)),
    };
    (start < end).then_some((start, end))
}

/// Write highlights as pretty JSON.
pub fn write_highlights(path: &Path, highlights: &[Highlight]) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(highlights)?)?;
    Ok(())
}

/// Read a `highlights.json` written by [`write_highlights`].
pub fn read_highlights(path: &Path) -> Result<Vec<Highlight>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CorteError;
    use crate::transcription::TranscriptSegment;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays canned responses, one per call.
    struct ScriptedScorer {
        responses: Mutex<Vec<Result<String>>>,
        calls: AtomicU32,
        last_request: Mutex<Option<ScoringRequest>>,
    }

    impl ScriptedScorer {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl HighlightScorer for ScriptedScorer {
        async fn score(&self, request: &ScoringRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn transcript() -> Transcript {
        Transcript::new(vec![
            TranscriptSegment::new(0.0, 30.0, "intro"),
            TranscriptSegment::new(30.0, 60.0, "the joke"),
            TranscriptSegment::new(60.0, 90.0, "the punchline"),
            TranscriptSegment::new(90.0, 120.0, "outro"),
        ])
    }

    fn selector(scorer: Arc<ScriptedScorer>, policy: OutOfRangePolicy) -> HighlightSelector {
        let settings = HighlightSettings {
            out_of_range: policy,
            backoff_seconds: 0,
            ..HighlightSettings::default()
        };
        HighlightSelector::new(scorer, Prompts::default(), &settings)
    }

    #[tokio::test]
    async fn test_single_window() {
        let scorer = ScriptedScorer::new(vec![Ok(
            r#"[{"start":30,"end":90,"reason":"funny moment"}]"#.to_string()
        )]);
        let highlights = selector(scorer.clone(), OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap();

        assert_eq!(highlights.len(), 1);
        let h = &highlights[0];
        assert_eq!((h.start, h.end, h.duration), (30.0, 90.0, 60.0));
        assert_eq!(h.reason, "funny moment");
        assert_eq!(h.transcript_excerpt, "the joke the punchline");

        let request = scorer.last_request.lock().unwrap().clone().unwrap();
        assert!(request.user.contains("Video duration: 120 seconds"));
        assert!(request.user.contains("[30.00 - 60.00] the joke"));
        assert!(!request.user.contains("{{"));
    }

    #[tokio::test]
    async fn test_out_of_range_window_rejected() {
        let scorer = ScriptedScorer::new(vec![Ok(r#"[
            {"start": 100, "end": 150, "reason": "too long"},
            {"start": 10, "end": 50, "reason": "fine"}
        ]"#
        .to_string())]);
        let highlights = selector(scorer, OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap();

        assert_eq!(highlights.len(), 1);
        assert_eq!(highlights[0].reason, "fine");
    }

    #[tokio::test]
    async fn test_out_of_range_window_clamped() {
        let scorer = ScriptedScorer::new(vec![Ok(r#"[
            {"start": 100, "end": 150, "reason": "tail"},
            {"start": 130, "end": 140, "reason": "past the end"}
        ]"#
        .to_string())]);
        let highlights = selector(scorer, OutOfRangePolicy::Clamp)
            .select(&transcript(), 120.0)
            .await
            .unwrap();

        assert_eq!(highlights.len(), 1);
        assert_eq!((highlights[0].start, highlights[0].end), (100.0, 120.0));
        assert_eq!(highlights[0].duration, 20.0);
    }

    #[tokio::test]
    async fn test_stated_duration_ignored() {
        let scorer = ScriptedScorer::new(vec![Ok(
            r#"[{"start": 10, "end": 40, "duration": 99, "reason": "x"}]"#.to_string()
        )]);
        let highlights = selector(scorer, OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap();
        assert_eq!(highlights[0].duration, 30.0);
    }

    #[tokio::test]
    async fn test_overlapping_windows_kept_in_order() {
        let scorer = ScriptedScorer::new(vec![Ok(r#"[
            {"start": 40, "end": 100, "reason": "second"},
            {"start": 30, "end": 90, "reason": "first"}
        ]"#
        .to_string())]);
        let highlights = selector(scorer, OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap();

        let reasons: Vec<&str> = highlights.iter().map(|h| h.reason.as_str()).collect();
        assert_eq!(reasons, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn test_retries_unavailable_service() {
        let scorer = ScriptedScorer::new(vec![
            Err(CorteError::ScoringServiceUnavailable("429".into())),
            Ok("[]".to_string()),
        ]);
        let highlights = selector(scorer.clone(), OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap();

        assert!(highlights.is_empty());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_fatal() {
        let scorer = ScriptedScorer::new(vec![
            Err(CorteError::ScoringServiceUnavailable("503".into())),
            Err(CorteError::ScoringServiceUnavailable("503".into())),
            Err(CorteError::ScoringServiceUnavailable("503".into())),
        ]);
        let err = selector(scorer.clone(), OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap_err();
        assert!(matches!(err, CorteError::ScoringServiceUnavailable(_)));
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_not_retried() {
        let scorer = ScriptedScorer::new(vec![Ok("no highlights today".to_string())]);
        let err = selector(scorer.clone(), OutOfRangePolicy::Reject)
            .select(&transcript(), 120.0)
            .await
            .unwrap_err();

        assert!(matches!(err, CorteError::MalformedScoringResponse(_)));
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fit_window() {
        use OutOfRangePolicy::*;
        assert_eq!(fit_window(0.0, 120.0, 120.0, Reject), Some((0.0, 120.0)));
        assert_eq!(fit_window(-1.0, 10.0, 120.0, Reject), None);
        assert_eq!(fit_window(-1.0, 10.0, 120.0, Clamp), Some((0.0, 10.0)));
        assert_eq!(fit_window(125.0, 130.0, 120.0, Clamp), None);
    }

    #[test]
    fn test_highlights_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highlights.json");
        let highlights = vec![Highlight::new(1.0, 31.0, "why", "words")];

        write_highlights(&path, &highlights).unwrap();
        assert_eq!(read_highlights(&path).unwrap(), highlights);
    }
}
