use crate::retry::RetryPolicyError;
use crate::schema::ValidationError;
use thiserror::Error;

/// Errors raised by the generation client.
///
/// The two variants are kept apart so that a stage can tell an unreachable
/// service (already retried by the client) from output that arrived but did
/// not match the expected shape (never retried).
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The completion service could not be reached or answered with an error.
    #[error("Transport failure from {provider}: {details}")]
    Transport {
        /// The provider that failed
        provider: String,
        /// Details about the failure
        details: String,
    },

    /// The service answered but the output failed decoding or schema checks.
    #[error("Invalid output: {0}")]
    Validation(#[from] ValidationError),
}

impl GenerationError {
    pub fn transport(provider: impl Into<String>, details: impl Into<String>) -> Self {
        GenerationError::Transport {
            provider: provider.into(),
            details: details.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Transport { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, GenerationError::Validation(_))
    }
}

/// Errors that stop a pipeline from starting or a collaborator from working.
///
/// Stage failures never show up here: stages degrade to their fallbacks and
/// record the problem in [`PipelineState::last_error`](crate::PipelineState).
///
/// # Non-Exhaustive
///
/// ```
/// use product_pipeline::PipelineError;
///
/// fn report(error: PipelineError) {
///     match error {
///         PipelineError::Configuration(msg) => eprintln!("Configuration error: {}", msg),
///         PipelineError::Io(e) => eprintln!("I/O error: {}", e),
///         _ => eprintln!("Error: {}", error),
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PipelineError {
    /// The pipeline or one of its collaborators is misconfigured.
    #[error("Invalid pipeline configuration: {0}")]
    Configuration(String),

    /// Settings could not be loaded or deserialized.
    #[error("Failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    /// A retry policy was built from invalid parameters.
    #[error("Invalid retry policy: {0}")]
    RetryPolicy(#[from] RetryPolicyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GenerationError::transport("groq", "connection refused");
        assert_eq!(
            error.to_string(),
            "Transport failure from groq: connection refused"
        );

        let error = PipelineError::Configuration("GROQ_API_KEY is not set".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid pipeline configuration: GROQ_API_KEY is not set"
        );
    }

    #[test]
    fn test_error_kind_helpers() {
        let transport = GenerationError::transport("mock", "down");
        assert!(transport.is_transport());
        assert!(!transport.is_validation());

        let validation = GenerationError::from(ValidationError::InvalidJson(
            "expected value at line 1 column 1".to_string(),
        ));
        assert!(validation.is_validation());
        assert!(!validation.is_transport());
        assert_eq!(
            validation.to_string(),
            "Invalid output: invalid JSON: expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_retry_policy_error_conversion() {
        let error = PipelineError::from(RetryPolicyError("multiplier must be greater than 0"));
        assert_eq!(
            error.to_string(),
            "Invalid retry policy: multiplier must be greater than 0"
        );
    }
}
