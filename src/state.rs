use crate::model::{Faq, ParsedProduct, ProductComparison, ProductDescription, SimilarProduct};
use crate::stage::Operations;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// The raw product record supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductInput {
    Structured(Map<String, Value>),
    Text(String),
}

impl ProductInput {
    /// Treats `text` as a structured record when it is a JSON object.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => ProductInput::Structured(map),
            _ => ProductInput::Text(text),
        }
    }

    /// `product_name` of a structured record, if it has one.
    pub fn product_name(&self) -> Option<&str> {
        match self {
            ProductInput::Structured(map) => map.get("product_name").and_then(Value::as_str),
            ProductInput::Text(_) => None,
        }
    }

    /// The input as text, JSON-encoded when structured.
    pub fn raw_text(&self) -> String {
        match self {
            ProductInput::Structured(map) => Value::Object(map.clone()).to_string(),
            ProductInput::Text(text) => text.clone(),
        }
    }
}

impl From<Value> for ProductInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ProductInput::Structured(map),
            Value::String(text) => ProductInput::Text(text),
            other => ProductInput::Text(other.to_string()),
        }
    }
}

impl From<&str> for ProductInput {
    fn from(text: &str) -> Self {
        ProductInput::Text(text.to_string())
    }
}

/// Mutable record threaded through every stage of one run.
///
/// `input` and `operations` are fixed at creation. Each output field is
/// written only by the stage that owns it, so a stage that was not
/// requested leaves its field `None`.
#[derive(Debug)]
pub struct PipelineState {
    input: ProductInput,
    operations: Operations,
    pub parsed_product: Option<ParsedProduct>,
    pub description: Option<ProductDescription>,
    pub similar_products: Option<Vec<SimilarProduct>>,
    pub comparison: Option<ProductComparison>,
    pub faqs: Option<Vec<Faq>>,
    /// Last non-fatal failure; later failures overwrite earlier ones.
    pub last_error: Option<String>,
    started_at: Instant,
}

impl PipelineState {
    pub fn new(input: ProductInput, operations: Operations) -> Self {
        Self {
            input,
            operations,
            parsed_product: None,
            description: None,
            similar_products: None,
            comparison: None,
            faqs: None,
            last_error: None,
            started_at: Instant::now(),
        }
    }

    pub fn input(&self) -> &ProductInput {
        &self.input
    }

    pub fn operations(&self) -> &Operations {
        &self.operations
    }

    /// The parsed product, or the degraded record if parsing has not
    /// produced one.
    pub fn product(&self) -> ParsedProduct {
        self.parsed_product
            .clone()
            .unwrap_or_else(|| ParsedProduct::degraded(self.input.raw_text()))
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Reduces the final state to what the caller sees.
    pub fn into_result(self) -> PipelineResult {
        let product_data = match self.parsed_product {
            Some(product) => product,
            None => ParsedProduct::degraded(self.input.raw_text()),
        };
        PipelineResult {
            product_data,
            description: self.description,
            comparison: self.comparison,
            faqs: self.faqs,
            error: self.last_error,
        }
    }
}

/// Caller-facing outcome of a run. Absent artifacts are omitted when
/// serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub product_data: ParsedProduct,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<ProductDescription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ProductComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faqs: Option<Vec<Faq>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
