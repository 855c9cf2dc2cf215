//! Caption compositing: reframe the source to vertical and burn in cues.

mod reframe;

pub use reframe::{Crop, ReframePlan};

use crate::config::CaptionSettings;
use crate::error::{CorteError, Result};
use crate::media::{MediaTools, RenderJob};
use crate::subtitles::{build_ass, exclusive_cues, AssStyle, SubtitleCue};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Produces the captioned vertical master video.
pub struct Compositor {
    media: Arc<dyn MediaTools>,
    settings: CaptionSettings,
}

impl Compositor {
    pub fn new(media: Arc<dyn MediaTools>, settings: &CaptionSettings) -> Self {
        Self {
            media,
            settings: settings.clone(),
        }
    }

    /// Reframe `video`, burn in `cues` and write the result to `output`.
    ///
    /// The ASS script is written to `ass_path` first. If the transcoder has no
    /// `subtitles` filter, the cues are drawn with `drawtext` instead.
    #[instrument(skip(self, cues), fields(video = %video.display(), cues = cues.len()))]
    pub async fn compose(
        &self,
        video: &Path,
        cues: &[SubtitleCue],
        ass_path: &Path,
        output: &Path,
    ) -> Result<ReframePlan> {
        let info = self.media.probe(video).await?;
        let source = info.dimensions().ok_or_else(|| {
            CorteError::TranscodeFailed(format!("{} has no video stream", video.display()))
        })?;

        let plan = ReframePlan::new(
            source,
            (self.settings.width, self.settings.height),
            self.settings.reframe,
        )?;
        debug!("Reframe plan: {:?}", plan);

        let style = AssStyle::from(&self.settings);
        tokio::fs::write(ass_path, build_ass(cues, &style)).await?;

        let job = RenderJob {
            input: video.to_path_buf(),
            output: output.to_path_buf(),
            video_filter: format!(
                "{},subtitles=filename={}",
                plan.filter(),
                escape_filter_path(ass_path)
            ),
        };

        match self.media.render(&job).await {
            Err(e) if is_missing_filter(&e) => {
                warn!("Transcoder lacks the subtitles filter, drawing captions with drawtext");
                let fallback = RenderJob {
                    video_filter: drawtext_chain(&plan.filter(), cues, &style),
                    ..job
                };
                self.media.render(&fallback).await?;
            }
            other => other?,
        }

        info!("Captioned master written to {}", output.display());
        Ok(plan)
    }
}

fn is_missing_filter(err: &CorteError) -> bool {
    match err {
        CorteError::TranscodeFailed(msg) => {
            msg.contains("No such filter") || msg.contains("Filter not found")
        }
        _ => false,
    }
}

/// Escape a path for use as a filter option value.
pub fn escape_filter_path(path: &Path) -> String {
    escape_filter_value(&path.to_string_lossy())
}

/// Escape `value` for both levels ffmpeg parses it at.
///
/// The option parser splits on `:` and the filtergraph parser on `[],;`;
/// each level strips one layer of backslashes and quotes.
pub fn escape_filter_value(value: &str) -> String {
    let option_level = backslash_escape(value, &['\\', '\'', ':']);
    backslash_escape(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn backslash_escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if special.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Reframe filter followed by one `drawtext` per cue.
pub fn drawtext_chain(reframe: &str, cues: &[SubtitleCue], style: &AssStyle) -> String {
    let mut chain = reframe.to_string();

    for cue in exclusive_cues(cues) {
        let enable = format!("gte(t,{:.3})*lt(t,{:.3})", cue.start, cue.end);
        chain.push_str(&format!(
            ",drawtext=expansion=none:text={}:enable={}:\
             fontsize={}:fontcolor=yellow:bordercolor=black:borderw={}:\
             x=(w-text_w)/2:y=h-th-{}",
            escape_filter_value(cue.text.trim()),
            escape_filter_value(&enable),
            style.font_size,
            style.outline,
            style.margin_bottom
        ));
    }

    chain
}
