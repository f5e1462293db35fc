use super::service::{ChatMessage, CompletionRequest, CompletionService};
use crate::config::LlmSettings;
use crate::error::{GenerationError, PipelineError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "openai-compatible";

/// Chat completions over an OpenAI-compatible HTTP API (Groq by default).
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleService {
    client: reqwest::Client,
    auth_header: String,
    base_url: String,
}

impl OpenAiCompatibleService {
    /// Builds the service, failing fast when the API key is missing.
    pub fn new(
        api_key: &str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "API key for the completion service is not set (GROQ_API_KEY)".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", api_key.trim()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, PipelineError> {
        Self::new(
            settings.api_key.as_deref().unwrap_or_default(),
            settings.base_url.as_str(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatibleService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let body = ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.chat_completions_url())
            .header("Authorization", self.auth_header.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::transport(PROVIDER, format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(GenerationError::transport(
                PROVIDER,
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            GenerationError::transport(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::transport(PROVIDER, "No content in response"))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
