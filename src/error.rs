//! Error types for Corte.

use crate::orchestrator::Stage;
use thiserror::Error;

/// Library-level error type for Corte operations.
#[derive(Error, Debug)]
pub enum CorteError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Video download failed: {0}")]
    AcquisitionFailed(String),

    #[error("Video download incomplete: {0}")]
    AcquisitionIncomplete(String),

    #[error("Transcript has no usable segments")]
    EmptyTranscript,

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Malformed scoring response: {0}")]
    MalformedScoringResponse(String),

    #[error("Scoring service unavailable: {0}")]
    ScoringServiceUnavailable(String),

    #[error("Transcode failed: {0}")]
    TranscodeFailed(String),

    #[error("Clip window {start:.2}s-{end:.2}s is outside the media duration ({duration:.2}s)")]
    ClipOutOfRange { start: f64, end: f64, duration: f64 },

    #[error("{stage} stage timed out after {seconds}s")]
    StageTimeout { stage: Stage, seconds: u64 },

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl CorteError {
    /// Stable name of the error kind, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CorteError::InvalidInput(_) => "InvalidInput",
            CorteError::AcquisitionFailed(_) => "AcquisitionFailed",
            CorteError::AcquisitionIncomplete(_) => "AcquisitionIncomplete",
            CorteError::EmptyTranscript => "EmptyTranscript",
            CorteError::TranscriptionFailed(_) => "TranscriptionFailed",
            CorteError::MalformedScoringResponse(_) => "MalformedScoringResponse",
            CorteError::ScoringServiceUnavailable(_) => "ScoringServiceUnavailable",
            CorteError::TranscodeFailed(_) => "TranscodeFailed",
            CorteError::ClipOutOfRange { .. } => "ClipOutOfRange",
            CorteError::StageTimeout { .. } => "StageTimeout",
            CorteError::ToolNotFound(_) => "ToolNotFound",
            CorteError::Config(_) => "Config",
            CorteError::Io(_) => "Io",
            CorteError::Json(_) => "Json",
            CorteError::TomlParse(_) => "TomlParse",
        }
    }

    /// Whether a network-dependent stage may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CorteError::AcquisitionFailed(_)
                | CorteError::TranscriptionFailed(_)
                | CorteError::ScoringServiceUnavailable(_)
        )
    }
}

/// Result type alias for Corte operations.
pub type Result<T> = std::result::Result<T, CorteError>;
