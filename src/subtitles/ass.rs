//! Advanced SubStation Alpha (`.ass`) output for burned-in captions.
//!
//! The script is laid out at the final render resolution so font size and
//! margins are in output pixels.

use super::{exclusive_cues, SubtitleCue};
use crate::config::CaptionSettings;

/// Visual style of the burned-in captions.
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub width: u32,
    pub height: u32,
    pub font: String,
    pub font_size: u32,
    pub outline: u32,
    pub margin_bottom: u32,
}

impl From<&CaptionSettings> for AssStyle {
    fn from(settings: &CaptionSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            font: settings.font.clone(),
            font_size: settings.font_size,
            outline: settings.outline,
            margin_bottom: settings.margin_bottom,
        }
    }
}

/// Build a complete ASS script showing one cue at a time.
pub fn build_ass(cues: &[SubtitleCue], style: &AssStyle) -> String {
    let mut out = String::new();

    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    out.push_str(&format!("PlayResX: {}\n", style.width));
    out.push_str(&format!("PlayResY: {}\n", style.height));
    out.push_str("WrapStyle: 0\n");
    out.push_str("ScaledBorderAndShadow: yes\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    // Yellow bold text, black outline, bottom-centre
    out.push_str(&format!(
        "Style: Active,{},{},&H0000FFFF,&H0000FFFF,&H00000000,&H64000000,1,0,0,0,100,100,0,0,1,{},0,2,80,80,{},1\n\n",
        style.font, style.font_size, style.outline, style.margin_bottom
    ));

    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");

    for cue in exclusive_cues(cues) {
        let text = escape_ass_text(&cue.text);
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "Dialogue: 0,{},{},Active,,0,0,0,,{}\n",
            format_ass_timestamp(cue.start),
            format_ass_timestamp(cue.end),
            text
        ));
    }

    out
}

/// Format timestamp for ASS (H:MM:SS.CC).
pub fn format_ass_timestamp(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let secs = (total_cs % 6_000) / 100;
    let cs = total_cs % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, cs)
}

// Braces open override blocks and raw newlines end the event line
fn escape_ass_text(text: &str) -> String {
    text.trim()
        .replace('{', "(")
        .replace('}', ")")
        .replace("\r\n", "\\N")
        .replace('\n', "\\N")
}
