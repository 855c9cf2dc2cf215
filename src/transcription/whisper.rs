//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::error::{CorteError, Result};
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    language: Option<String>,
}

impl WhisperTranscriber {
    pub fn new(client: Client<OpenAIConfig>, model: &str, language: Option<String>) -> Self {
        Self {
            client,
            model: model.to_string(),
            language,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        debug!("Uploading audio to {}", self.model);

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| CorteError::Config(format!("Failed to build transcription request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| CorteError::TranscriptionFailed(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = match response.segments {
            Some(segs) => segs
                .iter()
                .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim()))
                .collect(),
            // No segment list: one segment spanning the reported duration
            None if !response.text.trim().is_empty() => vec![TranscriptSegment::new(
                0.0,
                response.duration as f64,
                response.text.trim(),
            )],
            None => Vec::new(),
        };

        info!("Transcribed {} segments", segments.len());
        Ok(Transcript::with_text(response.text.trim().to_string(), segments))
    }
}
