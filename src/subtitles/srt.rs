//! SubRip (`.srt`) output.

use super::SubtitleCue;

/// Render cues as an SRT document.
pub fn format_srt(cues: &[SubtitleCue]) -> String {
    let mut output = String::new();

    for cue in cues {
        output.push_str(&format!("{}\n", cue.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(cue.start),
            format_srt_timestamp(cue.end)
        ));
        output.push_str(cue.text.trim());
        output.push_str("\n\n");
    }

    output
}

/// Format timestamp for SRT (00:00:00,000).
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, ms)
}
