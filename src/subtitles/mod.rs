//! Subtitle cues derived from a transcript.
//!
//! Each transcript segment is split into reveal units (single words or
//! fixed-size phrases) that appear one after another. A unit's share of the
//! segment's time is proportional to its character length, and the last unit
//! of a segment always ends exactly at the segment's end.

mod ass;
mod srt;

pub use ass::{build_ass, format_ass_timestamp, AssStyle};
pub use srt::{format_srt, format_srt_timestamp};

use crate::config::RevealUnit;
use crate::error::{CorteError, Result};
use crate::transcription::{Transcript, TranscriptSegment};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A single timed unit of on-screen caption text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    /// 1-based position in the cue list.
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// How segment text is cut into cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CuePolicy {
    pub unit: RevealUnit,
    /// Words per cue for [`RevealUnit::Phrase`].
    pub words_per_cue: usize,
}

impl Default for CuePolicy {
    fn default() -> Self {
        Self {
            unit: RevealUnit::Word,
            words_per_cue: 3,
        }
    }
}

impl CuePolicy {
    fn units(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        match self.unit {
            RevealUnit::Word => words.into_iter().map(str::to_string).collect(),
            RevealUnit::Phrase => words
                .chunks(self.words_per_cue.max(1))
                .map(|chunk| chunk.join(" "))
                .collect(),
        }
    }
}

/// Build the cue list for a transcript.
///
/// Fails with [`CorteError::EmptyTranscript`] when there are no segments or
/// none of them carries text over a positive interval.
pub fn build_cues(transcript: &Transcript, policy: &CuePolicy) -> Result<Vec<SubtitleCue>> {
    if transcript.segments.is_empty() {
        return Err(CorteError::EmptyTranscript);
    }

    let mut segments: Vec<&TranscriptSegment> = transcript.segments.iter().collect();
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut cues: Vec<SubtitleCue> = Vec::new();

    for segment in segments {
        if !segment.is_speakable() {
            debug!(
                "Skipping segment {:.2}-{:.2} without captionable text",
                segment.start, segment.end
            );
            continue;
        }

        // Overlapping segments start no earlier than the previous cue
        let floor = cues.last().map(|c| c.start).unwrap_or(segment.start);
        let start = segment.start.max(floor);
        if start >= segment.end {
            warn!(
                "Segment {:.2}-{:.2} lies under earlier captions, skipping",
                segment.start, segment.end
            );
            continue;
        }

        split_segment(&mut cues, start, segment.end, policy.units(&segment.text));
    }

    if cues.is_empty() {
        return Err(CorteError::EmptyTranscript);
    }

    debug!("Built {} cues from {} segments", cues.len(), transcript.segments.len());
    Ok(cues)
}

fn split_segment(cues: &mut Vec<SubtitleCue>, start: f64, end: f64, units: Vec<String>) {
    let weights: Vec<usize> = units.iter().map(|u| u.chars().count()).collect();
    let total: usize = weights.iter().sum();
    let span = end - start;
    let last = units.len().saturating_sub(1);

    let mut consumed = 0usize;
    let mut cursor = start;

    for (i, (text, weight)) in units.into_iter().zip(weights).enumerate() {
        consumed += weight;
        let unit_end = if i == last {
            end
        } else {
            (start + span * consumed as f64 / total as f64).clamp(cursor, end)
        };

        cues.push(SubtitleCue {
            index: cues.len() + 1,
            start: cursor,
            end: unit_end,
            text,
        });
        cursor = unit_end;
    }
}

/// Trim each cue so it ends no later than the next one starts.
///
/// Cues that end up empty are dropped and the remainder is renumbered, so at
/// most one cue is visible at any instant.
pub fn exclusive_cues(cues: &[SubtitleCue]) -> Vec<SubtitleCue> {
    let mut out: Vec<SubtitleCue> = Vec::with_capacity(cues.len());

    for (i, cue) in cues.iter().enumerate() {
        let end = match cues.get(i + 1) {
            Some(next) => cue.end.min(next.start),
            None => cue.end,
        };
        if end <= cue.start {
            continue;
        }
        out.push(SubtitleCue {
            index: out.len() + 1,
            start: cue.start,
            end,
            text: cue.text.clone(),
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(segments: &[(f64, f64, &str)]) -> Transcript {
        Transcript::new(
            segments
                .iter()
                .map(|(s, e, t)| TranscriptSegment::new(*s, *e, *t))
                .collect(),
        )
    }

    fn assert_well_formed(cues: &[SubtitleCue], transcript: &Transcript) {
        for pair in cues.windows(2) {
            assert!(pair[1].index > pair[0].index);
            assert!(pair[1].start >= pair[0].start);
        }
        for cue in cues {
            assert!(cue.end >= cue.start);
            assert!(
                transcript
                    .segments
                    .iter()
                    .any(|s| cue.start >= s.start && cue.end <= s.end),
                "cue {:?} escapes its segment",
                cue
            );
        }
    }

    #[test]
    fn test_single_segment_hello_world() {
        let t = transcript(&[(0.0, 5.0, "hello world")]);
        let cues = build_cues(&t, &CuePolicy::default()).unwrap();

        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start, 0.0);
        assert_eq!(cues[0].text, "hello");
        assert!((cues[0].end - 2.5).abs() < 1e-9);
        assert_eq!(cues[1].end, 5.0);
        assert!(cues.iter().all(|c| c.end <= 5.0));
        assert_well_formed(&cues, &t);
    }

    #[test]
    fn test_time_proportional_to_characters() {
        let t = transcript(&[(10.0, 20.0, "a bbbb")]);
        let cues = build_cues(&t, &CuePolicy::default()).unwrap();

        assert!((cues[0].end - 12.0).abs() < 1e-9);
        assert_eq!(cues[1].start, cues[0].end);
        assert_eq!(cues[1].end, 20.0);
    }

    #[test]
    fn test_phrase_chunks() {
        let t = transcript(&[(0.0, 6.0, "one two three four five")]);
        let policy = CuePolicy { unit: RevealUnit::Phrase, words_per_cue: 2 };
        let cues = build_cues(&t, &policy).unwrap();

        let texts: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["one two", "three four", "five"]);
        assert_eq!(cues.last().unwrap().end, 6.0);
    }

    #[test]
    fn test_indices_continue_across_segments() {
        let t = transcript(&[
            (0.0, 2.0, "first part"),
            (2.0, 4.5, "second"),
            (5.0, 9.0, "third bit here"),
        ]);
        let cues = build_cues(&t, &CuePolicy::default()).unwrap();

        let indices: Vec<usize> = cues.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5, 6]);
        assert_well_formed(&cues, &t);
    }

    #[test]
    fn test_many_segments_stay_inside_parents() {
        let segments: Vec<(f64, f64, String)> = (0..50)
            .map(|i| {
                let start = i as f64 * 3.1;
                let words = (0..(i % 7 + 1)).map(|w| "w".repeat(w + 1)).collect::<Vec<_>>();
                (start, start + 2.9, words.join(" "))
            })
            .collect();
        let t = Transcript::new(
            segments
                .iter()
                .map(|(s, e, text)| TranscriptSegment::new(*s, *e, text.clone()))
                .collect(),
        );

        for policy in [
            CuePolicy::default(),
            CuePolicy { unit: RevealUnit::Phrase, words_per_cue: 3 },
        ] {
            let cues = build_cues(&t, &policy).unwrap();
            assert_well_formed(&cues, &t);
        }
    }

    #[test]
    fn test_overlapping_segments_keep_starts_ordered() {
        let t = transcript(&[(0.0, 10.0, "long opening line"), (3.0, 12.0, "overlap")]);
        let cues = build_cues(&t, &CuePolicy::default()).unwrap();
        assert_well_formed(&cues, &t);
        assert_eq!(cues.last().unwrap().end, 12.0);
    }

    #[test]
    fn test_empty_transcript() {
        let t = Transcript::new(Vec::new());
        assert!(matches!(build_cues(&t, &CuePolicy::default()), Err(CorteError::EmptyTranscript)));
    }

    #[test]
    fn test_only_blank_segments_is_empty() {
        let t = transcript(&[(0.0, 1.0, "   "), (2.0, 2.0, "zero length")]);
        assert!(matches!(build_cues(&t, &CuePolicy::default()), Err(CorteError::EmptyTranscript)));
    }

    #[test]
    fn test_deterministic() {
        let t = transcript(&[(0.0, 7.3, "the same input gives the same cues")]);
        let a = build_cues(&t, &CuePolicy::default()).unwrap();
        let b = build_cues(&t, &CuePolicy::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exclusive_cues_trims_overlap() {
        let cues = vec![
            SubtitleCue { index: 1, start: 0.0, end: 3.0, text: "a".into() },
            SubtitleCue { index: 2, start: 2.0, end: 4.0, text: "b".into() },
            SubtitleCue { index: 3, start: 2.0, end: 5.0, text: "c".into() },
        ];
        let out = exclusive_cues(&cues);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].end, 2.0);
        assert_eq!(out[1].text, "c");
        assert_eq!(out[1].index, 2);
    }
}
