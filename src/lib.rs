//! # product-pipeline
//!
//! Turns a raw product record into a description, a competitive comparison
//! and a FAQ set by delegating generation to an external chat-completion
//! service.
//!
//! A run always parses the input, then visits the requested stages in the
//! fixed order description → comparison → faq. Generation output is
//! validated against explicit schemas; when generation or validation fails
//! the stage substitutes deterministic fallback data, records the problem
//! and the run carries on.
//!
//! ## Features
//!
//! - **Fixed routing**: [`Stage`] is a closed enum and the transition
//!   [`Stage::next`] depends only on the requested [`Operations`]
//! - **Retry Support**: exponential backoff for transport failures via [`RetryPolicy`]
//! - **Structured output**: [`Schema`] checks every generated document before it
//!   is accepted
//! - **Always an answer**: fallbacks keep the result shape intact
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use product_pipeline::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), PipelineError> {
//! let settings = Settings::load()?;
//! let workflow = Workflow::from_settings(&settings)?;
//!
//! let input = ProductInput::from_text(r#"{"product_name": "GlowBoost Vitamin C Serum", "price": "₹699"}"#);
//! let result = workflow.run(input, Operations::from_names(["faq"])).await;
//!
//! assert!(result.description.is_none());
//! assert!(result.faqs.map_or(0, |f| f.len()) >= 15);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Completion Services
//!
//! Anything implementing [`CompletionService`] can back a run:
//!
//! ```rust
//! use product_pipeline::prelude::*;
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Offline;
//!
//! #[async_trait]
//! impl CompletionService for Offline {
//!     async fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerationError> {
//!         Err(GenerationError::transport("offline", "no network"))
//!     }
//!
//!     fn provider_name(&self) -> &'static str {
//!         "offline"
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = GenerationClient::new(Arc::new(Offline)).with_retry_policy(RetryPolicy::none());
//! let workflow = Workflow::builder().client(client).build().expect("valid workflow");
//!
//! let result = workflow
//!     .run(ProductInput::from("Vitamin C serum, Rs 800"), Operations::from_names(["comparison"]))
//!     .await;
//!
//! // discovery failed, so the three fallback competitors are used
//! let comparison = result.comparison.expect("comparison requested");
//! assert_eq!(comparison.similar_products.len(), 3);
//! assert!(result.error.is_some());
//! # }
//! ```

pub mod config;
mod error;
mod fallback;
pub mod generation;
mod model;
mod retry;
mod schema;
mod stage;
mod stages;
mod state;
mod storage;
pub mod telemetry;
mod templates;
mod workflow;

pub mod prelude;

pub use crate::config::{LogFormat, LoggingSettings, Settings};
pub use error::{GenerationError, PipelineError};
pub use fallback::{fallback_faqs, fallback_products};
pub use generation::{CompletionRequest, CompletionService, GenerationClient};
pub use model::{
    ComparisonAnalysis, ComparisonBasis, Faq, FaqCategory, FaqPage, ParsedProduct,
    ProductComparison, ProductDescription, SimilarProduct, MIN_FAQS,
};
pub use retry::{with_retry, RetryPolicy, RetryPolicyError};
pub use schema::{FieldKind, FieldSpec, Schema, ValidationError};
pub use stage::{Operations, Stage};
pub use state::{PipelineResult, PipelineState, ProductInput};
pub use storage::SnapshotStore;
pub use templates::Templates;
pub use workflow::{StageRecord, StageStatus, Workflow, WorkflowBuilder};
