//! Chat-completion backed highlight scorer.

use super::{HighlightScorer, ScoringRequest};
use crate::config::HighlightSettings;
use crate::error::{CorteError, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tracing::debug;

/// Scores transcripts with an OpenAI chat model.
pub struct OpenAIScorer {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIScorer {
    pub fn new(client: Client<OpenAIConfig>, settings: &HighlightSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl HighlightScorer for OpenAIScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.as_str())
                .build()
                .map_err(|e| CorteError::Config(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user.as_str())
                .build()
                .map_err(|e| CorteError::Config(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| CorteError::Config(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            CorteError::ScoringServiceUnavailable(format!("{} request failed: {}", self.model, e))
        })?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                CorteError::MalformedScoringResponse("Empty response from scoring model".to_string())
            })?;

        debug!("Scoring response: {}", content.chars().take(500).collect::<String>());
        Ok(content)
    }
}
