//! Commonly used types and traits

pub use crate::config::Settings;
pub use crate::error::{GenerationError, PipelineError};
pub use crate::generation::{CompletionRequest, CompletionService, GenerationClient};
pub use crate::retry::RetryPolicy;
pub use crate::stage::{Operations, Stage};
pub use crate::state::{PipelineResult, PipelineState, ProductInput};
pub use crate::workflow::Workflow;
