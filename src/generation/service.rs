use crate::error::GenerationError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Text of the last user message.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map_or("", |m| m.content.as_str())
    }
}

/// The external text-generation service.
///
/// Implementations make exactly one call per invocation; retrying is the
/// caller's business.
#[async_trait]
pub trait CompletionService: Send + Sync + Debug {
    /// Sends the request and returns the generated text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;

    /// Name used in logs and transport errors.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays queued answers in order and records every request.
    ///
    /// An exhausted queue answers with a transport error.
    #[derive(Debug, Default)]
    pub struct ScriptedService {
        script: Mutex<VecDeque<Result<String, String>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedService {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, text: impl Into<String>) -> Self {
            self.script.lock().unwrap().push_back(Ok(text.into()));
            self
        }

        pub fn with_failure(self, details: impl Into<String>) -> Self {
            self.script.lock().unwrap().push_back(Err(details.into()));
            self
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedService {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.script.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(details)) => Err(GenerationError::transport("mock", details)),
                None => Err(GenerationError::transport("mock", "no scripted response")),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_last_user_message() {
        let request = CompletionRequest {
            model: "m".to_string(),
            messages: vec![
                ChatMessage::user("first"),
                ChatMessage::user("second"),
            ],
            temperature: 0.7,
            max_tokens: 16,
        };
        assert_eq!(request.prompt(), "second");
    }

    #[test]
    fn test_message_serialization() {
        let value = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(value, serde_json::json!({ "role": "user", "content": "hi" }));
    }
}
