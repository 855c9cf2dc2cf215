//! Run command implementation.

use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::clips::{Clip, ClipFailure};
use crate::config::Settings;
use crate::orchestrator::{Orchestrator, RunOutcome, RunReport, StageEvent, StageObserver};
use anyhow::Result;
use console::style;
use indicatif::ProgressBar;
use std::sync::Arc;

/// Run the full pipeline on one video.
pub async fn run_pipeline(url: &str, api_key: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run, &settings, api_key) {
        Output::error(&format!("{}", e));
        Output::info("Run 'corte doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    let api_key = api_key.unwrap_or_default();

    Output::info(&format!("Processing: {}", url));

    let spinner = Output::spinner("Starting");
    let orchestrator =
        Orchestrator::new(settings, api_key)?.with_observer(stage_printer(spinner.clone()));

    let result = orchestrator.run(url).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(failure) => {
            Output::error(&format!("{}", failure));
            Output::kv("Stage", failure.stage.as_str());
            Output::kv("Error kind", failure.kind());
            Output::kv("Artifacts", &failure.work_dir.display().to_string());
            Err(failure.into())
        }
    }
}

/// Prints one line per finished stage above the spinner.
fn stage_printer(spinner: ProgressBar) -> StageObserver {
    Arc::new(move |event: &StageEvent| match event {
        StageEvent::Started(stage) => spinner.set_message(format!("{}...", stage)),
        StageEvent::Completed { stage, elapsed } => spinner.println(format!(
            "  {} {} ({})",
            style("✓").green(),
            stage,
            format_duration(elapsed.as_secs_f64())
        )),
        StageEvent::Failed { stage, kind } => spinner.println(format!(
            "  {} {} ({})",
            style("✗").red(),
            stage,
            kind
        )),
        StageEvent::Finished => spinner.set_message("Done"),
    })
}

fn print_report(report: &RunReport) {
    Output::header("Run summary");
    Output::kv("Session", &report.session.work_dir.display().to_string());
    let session = &report.session;
    if let Some(source) = &session.source {
        Output::kv("Source", source);
    }
    if let Some(video) = &session.video {
        Output::kv("Video", &video.display().to_string());
    }
    if let Some(duration) = session.video_duration {
        Output::kv("Duration", &format_duration(duration));
    }
    Output::kv(
        "Transcript",
        &format!("{} segments, {} cues", report.segment_count, report.cue_count),
    );
    Output::kv("Captioned", &report.captioned_video.display().to_string());

    if !report.highlights.is_empty() {
        Output::header("Highlights");
        for (i, h) in report.highlights.iter().enumerate() {
            Output::highlight(i + 1, h.start, h.end, &h.reason);
        }
    }

    print_clips(&report.clips, &report.clip_failures);

    println!();
    match report.outcome {
        RunOutcome::Completed => Output::success(&format!(
            "Extracted {} of {} clips",
            report.clips.len(),
            report.highlights.len()
        )),
        RunOutcome::NoClipsExtracted => {
            Output::warning("Every highlight failed to extract; no clips written.")
        }
        RunOutcome::NoHighlights => {
            Output::warning("The model proposed no usable highlights; no clips written.")
        }
    }
}

pub(super) fn print_clips(clips: &[Clip], failures: &[ClipFailure]) {
    if !clips.is_empty() {
        Output::header("Clips");
        for clip in clips {
            Output::list_item(&clip.output_path.display().to_string());
        }
    }
    for failure in failures {
        Output::warning(&format!(
            "Clip {:02} ({:.1}s - {:.1}s) skipped: {}",
            failure.ordinal, failure.window.start, failure.window.end, failure.error
        ));
    }
}
