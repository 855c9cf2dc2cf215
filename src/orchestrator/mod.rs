//! Pipeline orchestrator for Corte.
//!
//! Runs Acquiring, Transcribing, then Selecting and Compositing side by side,
//! then Extracting. Every stage has its own timeout; the first failure stops
//! the run and leaves the session directory in place.

mod state;
#[cfg(test)]
mod tests;

pub use state::{Stage, StageEvent, StageObserver};

use crate::acquisition::{VideoAcquirer, YtDlpResolver};
use crate::captions::Compositor;
use crate::clips::{Clip, ClipExtractor, ClipFailure, ExtractionReport};
use crate::config::{PipelineSettings, Prompts, Settings};
use crate::error::{CorteError, Result};
use crate::highlights::{read_highlights, write_highlights, Highlight, HighlightScorer, HighlightSelector, OpenAIScorer};
use crate::media::{Ffmpeg, MediaTools};
use crate::openai::create_client_with_timeout;
use crate::retry::with_backoff;
use crate::session::Session;
use crate::subtitles::{build_cues, format_srt, CuePolicy, SubtitleCue};
use crate::transcription::{Transcriber, Transcript, WhisperTranscriber};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// How a run that reached `Done` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// At least one clip was written.
    Completed,
    /// Highlights were selected but every clip failed.
    NoClipsExtracted,
    /// The selector accepted no windows.
    NoHighlights,
}

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    /// Carries the source identifier, video path and probed duration.
    pub session: Session,
    pub segment_count: usize,
    pub cue_count: usize,
    pub highlights: Vec<Highlight>,
    pub captioned_video: PathBuf,
    pub clips: Vec<Clip>,
    pub clip_failures: Vec<ClipFailure>,
    pub outcome: RunOutcome,
}

/// A run that ended in `Failed`.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {error}")]
pub struct RunFailure {
    pub stage: Stage,
    pub error: CorteError,
    pub work_dir: PathBuf,
}

impl RunFailure {
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }
}

struct TranscriptionOutput {
    video_duration: f64,
    transcript: Transcript,
    cues: Vec<SubtitleCue>,
}

/// The main orchestrator for the Corte pipeline.
pub struct Orchestrator {
    settings: Settings,
    acquirer: Arc<dyn VideoAcquirer>,
    transcriber: Arc<dyn Transcriber>,
    media: Arc<dyn MediaTools>,
    selector: HighlightSelector,
    compositor: Compositor,
    extractor: ClipExtractor,
    runner: StageRunner,
}

impl Orchestrator {
    /// Create an orchestrator wired to yt-dlp, ffmpeg and OpenAI.
    pub fn new(settings: Settings, api_key: &str) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let stt_client = create_client_with_timeout(
            api_key,
            Duration::from_secs(settings.transcription.request_timeout_seconds),
        )?;
        let scoring_client = create_client_with_timeout(
            api_key,
            Duration::from_secs(settings.highlights.request_timeout_seconds),
        )?;

        let acquirer = Arc::new(YtDlpResolver::new(&settings)?);
        let transcriber = Arc::new(WhisperTranscriber::new(
            stt_client,
            &settings.transcription.model,
            settings.transcription.language.clone(),
        ));
        let scorer = Arc::new(OpenAIScorer::new(scoring_client, &settings.highlights));
        let media = Arc::new(Ffmpeg::new(&settings));

        info!(
            "Using {} for transcription and {} for highlights",
            settings.transcription.model, settings.highlights.model
        );

        Ok(Self::with_components(settings, prompts, acquirer, transcriber, scorer, media))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        acquirer: Arc<dyn VideoAcquirer>,
        transcriber: Arc<dyn Transcriber>,
        scorer: Arc<dyn HighlightScorer>,
        media: Arc<dyn MediaTools>,
    ) -> Self {
        let selector = HighlightSelector::new(scorer, prompts, &settings.highlights);
        let compositor = Compositor::new(media.clone(), &settings.captions);
        let extractor = ClipExtractor::new(media.clone(), &settings.clips);
        let runner = StageRunner::new(&settings.pipeline);

        Self {
            settings,
            acquirer,
            transcriber,
            media,
            selector,
            compositor,
            extractor,
            runner,
        }
    }

    /// Receive a [`StageEvent`] as each stage starts and ends.
    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        self.runner = self.runner.with_observer(observer);
        self
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run the whole pipeline for `source` in a fresh session directory.
    pub async fn run(&self, source: &str) -> std::result::Result<RunReport, RunFailure> {
        let output_dir = self.settings.output_dir();
        let session = Session::create(&output_dir).map_err(|error| RunFailure {
            stage: Stage::Init,
            error,
            work_dir: output_dir.clone(),
        })?;

        info!("Session {} in {}", session.id, session.work_dir.display());
        self.run_session(session, source).await
    }

    /// Run the whole pipeline inside an existing, empty session.
    #[instrument(skip(self, session), fields(session = %session.id))]
    pub async fn run_session(
        &self,
        mut session: Session,
        source: &str,
    ) -> std::result::Result<RunReport, RunFailure> {
        session.source = Some(source.trim().to_string());

        let video = self
            .stage(Stage::Acquiring, &session, self.acquirer.acquire(source, &session.work_dir))
            .await?;
        session.video = Some(video.clone());

        let TranscriptionOutput {
            video_duration,
            transcript,
            cues,
        } = self
            .stage(Stage::Transcribing, &session, self.transcribe(&session, &video))
            .await?;
        session.video_duration = Some(video_duration);

        let selecting = self.stage(
            Stage::Selecting,
            &session,
            self.select(&session, &transcript, video_duration),
        );
        let compositing = self.stage(
            Stage::Compositing,
            &session,
            self.composite(&session, &video, &cues),
        );

        let (highlights, captioned_video) = if self.settings.pipeline.parallel {
            tokio::try_join!(selecting, compositing)?
        } else {
            let highlights = selecting.await?;
            (highlights, compositing.await?)
        };

        if highlights.is_empty() {
            warn!("No highlights accepted, nothing to extract");
            self.runner.notify(&StageEvent::Finished);
            return Ok(RunReport {
                segment_count: transcript.segments.len(),
                cue_count: cues.len(),
                highlights,
                captioned_video,
                clips: Vec::new(),
                clip_failures: Vec::new(),
                outcome: RunOutcome::NoHighlights,
                session,
            });
        }

        let report = self
            .stage(
                Stage::Extracting,
                &session,
                self.extractor
                    .extract(&captioned_video, &highlights, &session.clips_dir()),
            )
            .await?;

        let outcome = if report.clips.is_empty() {
            RunOutcome::NoClipsExtracted
        } else {
            RunOutcome::Completed
        };
        self.runner.notify(&StageEvent::Finished);

        Ok(RunReport {
            segment_count: transcript.segments.len(),
            cue_count: cues.len(),
            highlights,
            captioned_video,
            clips: report.clips,
            clip_failures: report.failures,
            outcome,
            session,
        })
    }

    /// Re-run only the Extracting stage on an existing session.
    pub async fn extract_only(&self, work_dir: &Path) -> std::result::Result<ExtractionReport, RunFailure> {
        extract_session(&self.extractor, &self.runner, work_dir).await
    }

    /// Probe, extract audio, transcribe and write the subtitle artifacts.
    async fn transcribe(&self, session: &Session, video: &Path) -> Result<TranscriptionOutput> {
        let video_duration = self.media.probe(video).await?.duration_seconds;
        info!("Source duration {:.1}s", video_duration);

        let audio = session.audio_path();
        self.media.extract_audio(video, &audio).await?;

        let transcriber = &self.transcriber;
        let audio_ref = audio.as_path();
        let transcript = with_backoff(
            &self.settings.transcription.retry_policy(),
            "Transcription",
            move |_| transcriber.transcribe(audio_ref),
        )
        .await?;

        tokio::fs::write(
            session.transcript_path(),
            serde_json::to_string_pretty(&transcript)?,
        )
        .await?;

        let policy = CuePolicy {
            unit: self.settings.captions.reveal,
            words_per_cue: self.settings.captions.words_per_cue,
        };
        let cues = build_cues(&transcript, &policy)?;
        tokio::fs::write(session.subtitles_path(), format_srt(&cues)).await?;
        info!(
            "Transcript has {} segments, {} cues",
            transcript.segments.len(),
            cues.len()
        );

        Ok(TranscriptionOutput {
            video_duration,
            transcript,
            cues,
        })
    }

    async fn select(
        &self,
        session: &Session,
        transcript: &Transcript,
        video_duration: f64,
    ) -> Result<Vec<Highlight>> {
        let highlights = self.selector.select(transcript, video_duration).await?;
        write_highlights(&session.highlights_path(), &highlights)?;
        Ok(highlights)
    }

    async fn composite(&self, session: &Session, video: &Path, cues: &[SubtitleCue]) -> Result<PathBuf> {
        let output = session.captioned_video_path();
        self.compositor
            .compose(video, cues, &session.captions_path(), &output)
            .await?;
        Ok(output)
    }

    async fn stage<T, F>(
        &self,
        stage: Stage,
        session: &Session,
        work: F,
    ) -> std::result::Result<T, RunFailure>
    where
        F: Future<Output = Result<T>>,
    {
        self.runner.run(stage, &session.work_dir, work).await
    }
}

/// Runs single stages under the configured timeout and reports them.
#[derive(Clone)]
pub struct StageRunner {
    timeout: Duration,
    observer: Option<StageObserver>,
}

impl StageRunner {
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            timeout: settings.stage_timeout(),
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: StageObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run `work` as `stage`. A timeout becomes [`CorteError::StageTimeout`].
    pub async fn run<T, F>(
        &self,
        stage: Stage,
        work_dir: &Path,
        work: F,
    ) -> std::result::Result<T, RunFailure>
    where
        F: Future<Output = Result<T>>,
    {
        self.notify(&StageEvent::Started(stage));
        info!("{} started", stage);

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(CorteError::StageTimeout {
                stage,
                seconds: self.timeout.as_secs(),
            }),
        };

        match result {
            Ok(value) => {
                let elapsed = started.elapsed();
                info!("{} finished in {:.1}s", stage, elapsed.as_secs_f64());
                self.notify(&StageEvent::Completed { stage, elapsed });
                Ok(value)
            }
            Err(error) => {
                error!("{} failed ({}): {}", stage, error.kind(), error);
                self.notify(&StageEvent::Failed {
                    stage,
                    kind: error.kind(),
                });
                Err(RunFailure {
                    stage,
                    error,
                    work_dir: work_dir.to_path_buf(),
                })
            }
        }
    }

    pub fn notify(&self, event: &StageEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

/// Run the Extracting stage on an existing session directory.
///
/// Needs `highlights.json` and `video_captioned.mp4` from an earlier run.
pub async fn extract_session(
    extractor: &ClipExtractor,
    runner: &StageRunner,
    work_dir: &Path,
) -> std::result::Result<ExtractionReport, RunFailure> {
    let session = Session::open(work_dir).map_err(|error| RunFailure {
        stage: Stage::Init,
        error,
        work_dir: work_dir.to_path_buf(),
    })?;

    let extraction = async {
        let highlights_path = session.highlights_path();
        let master = session.captioned_video_path();
        for required in [&highlights_path, &master] {
            if !required.is_file() {
                return Err(CorteError::InvalidInput(format!(
                    "{} is missing",
                    required.display()
                )));
            }
        }

        let highlights = read_highlights(&highlights_path)?;
        extractor
            .extract(&master, &highlights, &session.clips_dir())
            .await
    };

    let report = runner.run(Stage::Extracting, &session.work_dir, extraction).await?;
    runner.notify(&StageEvent::Finished);
    Ok(report)
}
