use super::*;
use crate::highlights::ScoringRequest;
use crate::media::{MediaInfo, RenderJob};
use crate::transcription::TranscriptSegment;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

struct FakeAcquirer {
    error: Mutex<Option<CorteError>>,
}

impl FakeAcquirer {
    fn ok() -> Arc<Self> {
        Arc::new(Self { error: Mutex::new(None) })
    }

    fn failing(error: CorteError) -> Arc<Self> {
        Arc::new(Self { error: Mutex::new(Some(error)) })
    }
}

#[async_trait]
impl VideoAcquirer for FakeAcquirer {
    async fn acquire(&self, _source: &str, work_dir: &Path) -> Result<PathBuf> {
        if let Some(error) = self.error.lock().unwrap().take() {
            return Err(error);
        }
        let video = work_dir.join("video.mp4");
        std::fs::write(&video, b"source")?;
        Ok(video)
    }
}

struct FakeTranscriber {
    segments: Vec<TranscriptSegment>,
    failures: AtomicU32,
    calls: AtomicU32,
}

impl FakeTranscriber {
    fn new(segments: Vec<TranscriptSegment>) -> Arc<Self> {
        Arc::new(Self { segments, failures: AtomicU32::new(0), calls: AtomicU32::new(0) })
    }

    fn hello() -> Arc<Self> {
        Self::new(vec![
            TranscriptSegment::new(0.0, 5.0, "hello world"),
            TranscriptSegment::new(30.0, 60.0, "the setup"),
            TranscriptSegment::new(60.0, 90.0, "the punchline"),
        ])
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(audio_path.ends_with("audio.mp3"));
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(CorteError::TranscriptionFailed("connection reset".into()));
        }
        Ok(Transcript::new(self.segments.clone()))
    }
}

struct FakeScorer {
    response: String,
    delay: Duration,
}

impl FakeScorer {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(Self { response: response.to_string(), delay: Duration::ZERO })
    }

    fn slow(response: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self { response: response.to_string(), delay })
    }
}

#[async_trait]
impl HighlightScorer for FakeScorer {
    async fn score(&self, _request: &ScoringRequest) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}

struct FakeMedia {
    source_duration: f64,
    master_duration: f64,
    render_error: Mutex<Option<CorteError>>,
    cuts: Mutex<Vec<(f64, f64)>>,
}

impl FakeMedia {
    fn new(duration: f64) -> Arc<Self> {
        Self::with_master(duration, duration)
    }

    fn with_master(source_duration: f64, master_duration: f64) -> Arc<Self> {
        Arc::new(Self {
            source_duration,
            master_duration,
            render_error: Mutex::new(None),
            cuts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MediaTools for FakeMedia {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        let duration_seconds = if path.ends_with("video_captioned.mp4") {
            self.master_duration
        } else {
            self.source_duration
        };
        Ok(MediaInfo { duration_seconds, width: Some(1920), height: Some(1080) })
    }

    async fn extract_audio(&self, _video: &Path, dest: &Path) -> Result<()> {
        std::fs::write(dest, b"audio")?;
        Ok(())
    }

    async fn render(&self, job: &RenderJob) -> Result<()> {
        if let Some(error) = self.render_error.lock().unwrap().take() {
            return Err(error);
        }
        std::fs::write(&job.output, b"master")?;
        Ok(())
    }

    async fn cut(&self, _source: &Path, start: f64, end: f64, dest: &Path) -> Result<()> {
        self.cuts.lock().unwrap().push((start, end));
        std::fs::write(dest, b"clip")?;
        Ok(())
    }
}

fn settings(output_dir: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.general.output_dir = output_dir.to_string_lossy().into_owned();
    settings.transcription.backoff_seconds = 0;
    settings.highlights.backoff_seconds = 0;
    settings
}

fn orchestrator(
    settings: Settings,
    acquirer: Arc<FakeAcquirer>,
    transcriber: Arc<FakeTranscriber>,
    scorer: Arc<FakeScorer>,
    media: Arc<FakeMedia>,
) -> Orchestrator {
    Orchestrator::with_components(settings, Prompts::default(), acquirer, transcriber, scorer, media)
}

const FUNNY: &str = r#"[{"start": 30, "end": 90, "reason": "funny moment"}]"#;

#[tokio::test]
async fn test_single_highlight_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(FUNNY),
        FakeMedia::new(120.0),
    );

    let report = orch.run("https://youtu.be/abc").await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.highlights.len(), 1);
    let h = &report.highlights[0];
    assert_eq!((h.start, h.duration, h.end), (30.0, 60.0, 90.0));
    assert_eq!(h.reason, "funny moment");

    assert_eq!(report.clips.len(), 1);
    assert!(report.clips[0].output_path.ends_with("clips/clip_01_30s_90s.mp4"));
    assert!(report.clips[0].output_path.exists());

    let work = &report.session.work_dir;
    assert_eq!(report.session.source.as_deref(), Some("https://youtu.be/abc"));
    assert_eq!(report.session.video.as_deref(), Some(work.join("video.mp4").as_path()));
    assert_eq!(report.session.video_duration, Some(120.0));
    for artifact in [
        "video.mp4",
        "audio.mp3",
        "transcript.json",
        "subtitles.srt",
        "captions.ass",
        "highlights.json",
        "video_captioned.mp4",
    ] {
        assert!(work.join(artifact).is_file(), "{artifact} missing");
    }
}

#[tokio::test]
async fn test_subtitles_cover_first_segment() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::new(vec![TranscriptSegment::new(0.0, 5.0, "hello world")]),
        FakeScorer::new("[]"),
        FakeMedia::new(120.0),
    );

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.cue_count, 2);

    let srt = std::fs::read_to_string(report.session.subtitles_path()).unwrap();
    assert!(srt.starts_with("1\n00:00:00,000 --> "));
    assert!(srt.contains("--> 00:00:05,000\nworld"));
}

#[tokio::test]
async fn test_out_of_range_highlight_dropped_run_continues() {
    let dir = tempfile::tempdir().unwrap();
    let response = r#"[
        {"start": 100, "end": 150, "reason": "runs past the end"},
        {"start": 30, "end": 90, "reason": "funny moment"}
    ]"#;
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(response),
        FakeMedia::new(120.0),
    );

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.highlights.len(), 1);
    assert_eq!(report.clips.len(), 1);
    assert!(report.highlights.iter().all(|h| h.start >= 0.0 && h.end <= 120.0));
}

#[tokio::test]
async fn test_acquisition_failure_stops_run() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = FakeTranscriber::hello();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::failing(CorteError::AcquisitionFailed("HTTP Error 403".into())),
        transcriber.clone(),
        FakeScorer::new(FUNNY),
        FakeMedia::new(120.0),
    )
    .with_observer(Arc::new(move |e: &StageEvent| sink.lock().unwrap().push(e.clone())));

    let failure = orch.run("abc").await.unwrap_err();

    assert_eq!(failure.stage, Stage::Acquiring);
    assert_eq!(failure.kind(), "AcquisitionFailed");
    assert!(failure.work_dir.is_dir());
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    assert!(!failure.work_dir.join("audio.mp3").exists());

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            StageEvent::Started(Stage::Acquiring),
            StageEvent::Failed { stage: Stage::Acquiring, kind: "AcquisitionFailed" },
        ]
    );
}

#[tokio::test]
async fn test_overlapping_highlights_both_extracted() {
    let dir = tempfile::tempdir().unwrap();
    let response = r#"[
        {"start": 30, "end": 90, "reason": "a"},
        {"start": 45, "end": 100, "reason": "b"}
    ]"#;
    let media = FakeMedia::new(120.0);
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(response),
        media.clone(),
    );

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.clips.len(), 2);
    assert_eq!(*media.cuts.lock().unwrap(), vec![(30.0, 90.0), (45.0, 100.0)]);
}

#[tokio::test]
async fn test_no_highlights_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new("```json\n[]\n```"),
        FakeMedia::new(120.0),
    )
    .with_observer(Arc::new(move |e: &StageEvent| sink.lock().unwrap().push(e.clone())));

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.outcome, RunOutcome::NoHighlights);
    assert!(report.clips.is_empty());

    let events = events.lock().unwrap();
    assert!(!events.iter().any(|e| e.stage() == Stage::Extracting));
    assert_eq!(events.last(), Some(&StageEvent::Finished));
}

#[tokio::test]
async fn test_every_clip_failing_is_reported_distinctly() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(FUNNY),
        FakeMedia::with_master(120.0, 20.0),
    );

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.outcome, RunOutcome::NoClipsExtracted);
    assert_eq!(report.clip_failures.len(), 1);
    assert!(matches!(report.clip_failures[0].error, CorteError::ClipOutOfRange { .. }));
}

#[tokio::test]
async fn test_empty_transcript_fails_transcribing() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::new(Vec::new()),
        FakeScorer::new(FUNNY),
        FakeMedia::new(120.0),
    );

    let failure = orch.run("abc").await.unwrap_err();
    assert_eq!(failure.stage, Stage::Transcribing);
    assert!(matches!(failure.error, CorteError::EmptyTranscript));
    assert!(failure.work_dir.join("transcript.json").is_file());
}

#[tokio::test]
async fn test_transcription_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let transcriber = FakeTranscriber::hello();
    transcriber.failures.store(2, Ordering::SeqCst);

    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        transcriber.clone(),
        FakeScorer::new(FUNNY),
        FakeMedia::new(120.0),
    );

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_stage_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.pipeline.stage_timeout_seconds = 1;

    let orch = orchestrator(
        settings,
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::slow(FUNNY, Duration::from_secs(30)),
        FakeMedia::new(120.0),
    );

    let failure = orch.run("abc").await.unwrap_err();
    assert_eq!(failure.stage, Stage::Selecting);
    assert!(matches!(
        failure.error,
        CorteError::StageTimeout { stage: Stage::Selecting, seconds: 1 }
    ));
}

#[tokio::test]
async fn test_compositing_failure_cancels_selecting() {
    let dir = tempfile::tempdir().unwrap();
    let media = FakeMedia::new(120.0);
    *media.render_error.lock().unwrap() = Some(CorteError::TranscodeFailed("encoder died".into()));

    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::slow(FUNNY, Duration::from_secs(10)),
        media,
    );

    let started = Instant::now();
    let failure = orch.run("abc").await.unwrap_err();

    assert_eq!(failure.stage, Stage::Compositing);
    assert_eq!(failure.kind(), "TranscodeFailed");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!failure.work_dir.join("highlights.json").exists());
    assert!(!failure.work_dir.join("clips").exists());
}

#[tokio::test]
async fn test_sequential_mode_runs_both_branches() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.pipeline.parallel = false;

    let orch = orchestrator(
        settings,
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(FUNNY),
        FakeMedia::new(120.0),
    );

    let report = orch.run("abc").await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.captioned_video.is_file());
}

#[tokio::test]
async fn test_extract_only_reuses_session() {
    let dir = tempfile::tempdir().unwrap();
    let media = FakeMedia::new(120.0);
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(FUNNY),
        media.clone(),
    );

    let report = orch.run("abc").await.unwrap();
    let clip = report.clips[0].output_path.clone();
    std::fs::remove_dir_all(report.session.clips_dir()).unwrap();

    let rerun = orch.extract_only(&report.session.work_dir).await.unwrap();
    assert_eq!(rerun.clips.len(), 1);
    assert_eq!(rerun.clips[0].output_path, clip);
    assert!(clip.exists());
    assert_eq!(media.cuts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_extract_only_requires_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(FUNNY),
        FakeMedia::new(120.0),
    );

    let failure = orch.extract_only(dir.path()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Extracting);
    assert!(matches!(failure.error, CorteError::InvalidInput(_)));

    let failure = orch.extract_only(&dir.path().join("missing")).await.unwrap_err();
    assert_eq!(failure.stage, Stage::Init);
}

#[tokio::test]
async fn test_extract_only_skips_edited_bad_windows() {
    let dir = tempfile::tempdir().unwrap();
    let media = FakeMedia::new(120.0);
    let orch = orchestrator(
        settings(dir.path()),
        FakeAcquirer::ok(),
        FakeTranscriber::hello(),
        FakeScorer::new(FUNNY),
        media.clone(),
    );

    let report = orch.run("abc").await.unwrap();
    write_highlights(
        &report.session.highlights_path(),
        &[
            Highlight::new(-10.0, 20.0, "negative start", ""),
            Highlight::new(80.0, 40.0, "inverted", ""),
            Highlight::new(30.0, 90.0, "funny moment", ""),
        ],
    )
    .unwrap();

    let rerun = orch.extract_only(&report.session.work_dir).await.unwrap();
    assert_eq!(rerun.clips.len(), 1);
    assert_eq!(rerun.clips[0].ordinal, 3);
    assert_eq!(rerun.failures.len(), 2);
    assert!(rerun
        .failures
        .iter()
        .all(|f| matches!(f.error, CorteError::ClipOutOfRange { .. })));
}
