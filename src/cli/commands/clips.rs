//! Clips command implementation.

use super::run::print_clips;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::clips::ClipExtractor;
use crate::config::Settings;
use crate::media::Ffmpeg;
use crate::orchestrator::{extract_session, StageRunner};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Re-extract clips from an existing session directory.
pub async fn run_clips(session_dir: &str, settings: &Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Clips, settings, None) {
        Output::error(&format!("{}", e));
        Output::info("Run 'corte doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let extractor = ClipExtractor::new(Arc::new(Ffmpeg::new(settings)), &settings.clips);
    let runner = StageRunner::new(&settings.pipeline);

    let spinner = Output::spinner("Extracting clips...");
    let result = extract_session(&extractor, &runner, Path::new(session_dir)).await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            print_clips(&report.clips, &report.failures);
            if report.clips.is_empty() {
                Output::warning(&format!("No clips extracted out of {}", report.attempted()));
            } else {
                Output::success(&format!(
                    "Extracted {} of {} clips",
                    report.clips.len(),
                    report.attempted()
                ));
            }
            Ok(())
        }
        Err(failure) => {
            Output::error(&format!("{}", failure));
            Output::kv("Error kind", failure.kind());
            Err(failure.into())
        }
    }
}
