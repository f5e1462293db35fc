//! Client for the external text-generation service.
//!
//! [`GenerationClient`] adds the retry policy, default sampling parameters
//! and structured-output handling on top of a [`CompletionService`].

mod fence;
mod openai;
mod service;

pub use fence::strip_code_fences;
pub use openai::OpenAiCompatibleService;
pub use service::{ChatMessage, CompletionRequest, CompletionService, Role};

#[cfg(test)]
pub(crate) use service::mock;

use crate::config::Settings;
use crate::error::{GenerationError, PipelineError};
use crate::retry::{with_retry, RetryPolicy};
use crate::schema::{self, Schema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Clone)]
pub struct GenerationClient {
    service: Arc<dyn CompletionService>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry_policy: RetryPolicy,
}

impl GenerationClient {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Builds a client backed by the HTTP service described in `settings`.
    ///
    /// # Errors
    ///
    /// Fails with [`PipelineError::Configuration`] when the API key is
    /// missing and with [`PipelineError::RetryPolicy`] when the retry
    /// settings are invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        let service = OpenAiCompatibleService::from_settings(&settings.llm)?;
        Ok(Self::new(Arc::new(service))
            .with_model(settings.llm.model.as_str())
            .with_temperature(settings.llm.temperature)
            .with_max_tokens(settings.llm.max_tokens)
            .with_retry_policy(settings.retry.policy()?))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` as a single user message, retrying transport failures.
    ///
    /// `None` parameters fall back to the client defaults. After the retry
    /// budget is spent the last error is returned.
    pub async fn generate_text(
        &self,
        prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: temperature.unwrap_or(self.temperature),
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
        };
        let request = &request;
        let service = self.service.as_ref();

        with_retry(&self.retry_policy, move || async move {
            service.complete(request).await.map_err(|e| {
                error!("Generation via {} failed: {}", service.provider_name(), e);
                e
            })
        })
        .await
    }

    /// Generates text and decodes it as JSON after stripping code fences.
    ///
    /// No shape checks are applied.
    pub async fn generate_json(
        &self,
        prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<Value, GenerationError> {
        let response = self.generate_text(prompt, temperature, max_tokens).await?;
        schema::decode(strip_code_fences(&response)).map_err(|e| {
            error!("Failed to parse JSON: {}", e);
            debug!("Raw response: {}", response);
            GenerationError::Validation(e)
        })
    }

    /// Generates output that must match `schema` and maps it onto `T`.
    ///
    /// The schema is appended to the prompt together with a no-markdown
    /// instruction. Decode and shape failures come back as
    /// [`GenerationError::Validation`] and are never retried.
    pub async fn generate_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &Schema,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<T, GenerationError> {
        let prompt = structured_prompt(prompt, schema);
        let value = self.generate_json(&prompt, temperature, max_tokens).await?;

        schema.conform(value).map_err(|e| {
            error!("Output does not match {}: {}", schema.name(), e);
            GenerationError::Validation(e)
        })
    }
}

fn structured_prompt(prompt: &str, schema: &Schema) -> String {
    format!(
        "{}\n\nReturn ONLY valid JSON matching this schema:\n{:#}\n\nDo not include any markdown formatting or code blocks.",
        prompt,
        schema.describe()
    )
}

#[cfg(test)]
mod tests {
    use super::mock::ScriptedService;
    use super::*;
    use crate::model::{FaqPage, ParsedProduct, MIN_FAQS};
    use crate::schema::ValidationError;
    use serde_json::json;
    use std::time::Duration;

    fn client(service: &Arc<ScriptedService>) -> GenerationClient {
        GenerationClient::new(service.clone()).with_retry_policy(RetryPolicy::fixed(3, Duration::ZERO))
    }

    fn faq_page(count: usize) -> String {
        let faq = json!({ "question": "Q?", "answer": "A.", "category": "Safety" });
        json!({ "faqs": vec![faq; count] }).to_string()
    }

    #[tokio::test]
    async fn test_generate_text_uses_defaults_and_overrides() {
        let service = Arc::new(ScriptedService::new().with_response("a").with_response("b"));
        let client = client(&service).with_model("test-model");

        assert_eq!(client.generate_text("one", None, None).await.unwrap(), "a");
        assert_eq!(client.generate_text("two", Some(0.2), Some(64)).await.unwrap(), "b");

        let requests = service.requests();
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(requests[0].temperature, DEFAULT_TEMPERATURE);
        assert_eq!(requests[0].max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(requests[1].prompt(), "two");
        assert_eq!(requests[1].temperature, 0.2);
        assert_eq!(requests[1].max_tokens, 64);
    }

    #[tokio::test]
    async fn test_generate_text_retries_transport_failures() {
        let service = Arc::new(
            ScriptedService::new()
                .with_failure("timeout")
                .with_failure("timeout")
                .with_response("finally"),
        );
        let text = client(&service).generate_text("p", None, None).await.unwrap();
        assert_eq!(text, "finally");
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn test_generate_text_gives_up_after_three_attempts() {
        let service = Arc::new(ScriptedService::new());
        let err = client(&service).generate_text("p", None, None).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_backs_off_between_attempts() {
        let service = Arc::new(ScriptedService::new());
        let client = GenerationClient::new(service.clone());
        let start = tokio::time::Instant::now();

        assert!(client.generate_text("p", None, None).await.is_err());
        assert_eq!(service.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_structured_strips_json_fence() {
        let service = Arc::new(ScriptedService::new().with_response(
            "```json\n{\"product_name\": \"GlowBoost\", \"price\": \"₹699\"}\n```",
        ));
        let product: ParsedProduct = client(&service)
            .generate_structured("extract", ParsedProduct::schema(), None, None)
            .await
            .unwrap();
        assert_eq!(product.product_name, "GlowBoost");
        assert_eq!(product.price.as_deref(), Some("₹699"));
    }

    #[tokio::test]
    async fn test_structured_accepts_unfenced_output() {
        let service = Arc::new(ScriptedService::new().with_response("{\"product_name\": \"Plain\"}"));
        let product: ParsedProduct = client(&service)
            .generate_structured("extract", ParsedProduct::schema(), None, None)
            .await
            .unwrap();
        assert_eq!(product.product_name, "Plain");
    }

    #[tokio::test]
    async fn test_structured_prompt_carries_schema() {
        let service = Arc::new(ScriptedService::new().with_response("{\"product_name\": \"X\"}"));
        let _: ParsedProduct = client(&service)
            .generate_structured("extract this", ParsedProduct::schema(), None, None)
            .await
            .unwrap();

        let prompt = service.requests()[0].prompt().to_string();
        assert!(prompt.starts_with("extract this"));
        assert!(prompt.contains("\"title\": \"ParsedProduct\""));
        assert!(prompt.contains("Do not include any markdown formatting"));
    }

    #[tokio::test]
    async fn test_structured_rejects_short_faq_page_without_retry() {
        let service = Arc::new(ScriptedService::new().with_response(faq_page(MIN_FAQS - 1)));
        let err = client(&service)
            .generate_structured::<FaqPage>("faqs", FaqPage::schema(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::Validation(ValidationError::TooFewItems { min: 15, actual: 14, .. })
        ));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_structured_invalid_json_is_validation_error() {
        let service = Arc::new(ScriptedService::new().with_response("Sure! Here are your FAQs."));
        let err = client(&service)
            .generate_structured::<FaqPage>("faqs", FaqPage::schema(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Validation(ValidationError::InvalidJson(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_json_is_unchecked() {
        let service = Arc::new(ScriptedService::new().with_response("```\n[1, 2]\n```"));
        let value = client(&service).generate_json("p", None, None).await.unwrap();
        assert_eq!(value, json!([1, 2]));
    }
}
