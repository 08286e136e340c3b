//! OpenAI-backed transcript summarization.

use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::Summarizer;
use crate::config::SummaryPrompts;
use crate::error::{ReferentError, Result};
use crate::openai::create_client;

/// Summarizer backed by OpenAI chat completions.
pub struct OpenAiSummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: SummaryPrompts,
}

impl OpenAiSummarizer {
    /// Create a summarizer with an explicit API key and chat model.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: create_client(api_key),
            model: model.to_string(),
            prompts: SummaryPrompts::default(),
        }
    }

    /// Set custom prompts.
    pub fn with_prompts(mut self, prompts: SummaryPrompts) -> Self {
        self.prompts = prompts;
        self
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(skip(self, transcript), fields(transcript_chars = transcript.len()))]
    async fn summarize(&self, transcript: &str) -> Result<String> {
        let user_prompt = self.prompts.render_user(transcript);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.system.clone())
                .build()
                .map_err(|e| ReferentError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| ReferentError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| ReferentError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ReferentError::Summarization(format!("Failed to summarize: {}", e)))?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| ReferentError::Summarization("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated summary ({} chars)", summary.len());

        Ok(summary)
    }
}
