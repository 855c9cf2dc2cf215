//! Transcription module for Corte.
//!
//! Speech-to-text runs behind the [`Transcriber`] trait; the default
//! implementation uploads the extracted audio track to OpenAI Whisper.

mod models;
mod whisper;

pub use models::{Transcript, TranscriptSegment};
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file and return segments with timestamps.
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript>;
}
