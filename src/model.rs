//! Structured records produced by the pipeline stages.

use crate::schema::{FieldKind, FieldSpec, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Minimum number of FAQ items a stage may hand back.
pub const MIN_FAQS: usize = 15;

/// Number of competitor products a comparison works with.
pub const SIMILAR_PRODUCT_COUNT: usize = 3;

/// Product fields extracted by the parse stage.
///
/// Only `product_name` is mandatory. `raw_data` is set on the degraded
/// record produced when parsing fails, and carries the input verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedProduct {
    pub product_name: String,
    #[serde(default)]
    pub concentration: Option<String>,
    #[serde(default)]
    pub skin_type: Option<String>,
    #[serde(default)]
    pub key_ingredients: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub how_to_use: Option<String>,
    #[serde(default)]
    pub side_effects: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub price_in_inr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<String>,
}

impl ParsedProduct {
    /// Name used by the degraded record.
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    pub fn named(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            concentration: None,
            skin_type: None,
            key_ingredients: None,
            benefits: None,
            how_to_use: None,
            side_effects: None,
            price: None,
            price_in_inr: None,
            raw_data: None,
        }
    }

    /// The placeholder record kept when the input could not be parsed.
    pub fn degraded(raw_data: impl Into<String>) -> Self {
        Self {
            raw_data: Some(raw_data.into()),
            ..Self::named(Self::UNKNOWN_NAME)
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.raw_data.is_some()
    }

    /// The listed price, preferring `price` over `price_in_inr`.
    pub fn price_text(&self) -> Option<&str> {
        self.price
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .or(self.price_in_inr.as_deref())
    }

    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::object(
                "ParsedProduct",
                vec![
                    FieldSpec::required("product_name", FieldKind::String),
                    FieldSpec::optional("concentration", FieldKind::String),
                    FieldSpec::optional("skin_type", FieldKind::String),
                    FieldSpec::optional("key_ingredients", FieldKind::String),
                    FieldSpec::optional("benefits", FieldKind::String),
                    FieldSpec::optional("how_to_use", FieldKind::String),
                    FieldSpec::optional("side_effects", FieldKind::String),
                    FieldSpec::optional("price", FieldKind::String),
                    FieldSpec::optional("price_in_inr", FieldKind::String),
                ],
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub usage_instructions: Option<String>,
}

impl ProductDescription {
    /// Placeholder used when generation fails.
    pub fn fallback(product: &ParsedProduct) -> Self {
        Self {
            title: product.product_name.clone(),
            description: "Description generation failed".to_string(),
            highlights: Vec::new(),
            usage_instructions: Some(String::new()),
        }
    }

    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::object(
                "ProductDescription",
                vec![
                    FieldSpec::required("title", FieldKind::String),
                    FieldSpec::required("description", FieldKind::String),
                    FieldSpec::optional("highlights", FieldKind::list(FieldKind::String)),
                    FieldSpec::optional("usage_instructions", FieldKind::String),
                ],
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaqCategory {
    Informational,
    Safety,
    Usage,
    Purchase,
    Comparison,
}

impl FaqCategory {
    /// All categories in presentation order.
    pub const ALL: [FaqCategory; 5] = [
        FaqCategory::Informational,
        FaqCategory::Safety,
        FaqCategory::Usage,
        FaqCategory::Purchase,
        FaqCategory::Comparison,
    ];

    const NAMES: &'static [&'static str] =
        &["Informational", "Safety", "Usage", "Purchase", "Comparison"];

    pub fn as_str(&self) -> &'static str {
        match self {
            FaqCategory::Informational => "Informational",
            FaqCategory::Safety => "Safety",
            FaqCategory::Usage => "Usage",
            FaqCategory::Purchase => "Purchase",
            FaqCategory::Comparison => "Comparison",
        }
    }
}

impl fmt::Display for FaqCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
    pub category: FaqCategory,
}

impl Faq {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, category: FaqCategory) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category,
        }
    }
}

/// Envelope the FAQ stage asks the generator for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqPage {
    pub faqs: Vec<Faq>,
}

impl FaqPage {
    /// The item minimum is part of the schema, so a short list fails
    /// validation like any other malformed answer.
    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let item = FieldKind::Object(vec![
                FieldSpec::required("question", FieldKind::String),
                FieldSpec::required("answer", FieldKind::String),
                FieldSpec::required("category", FieldKind::OneOf(FaqCategory::NAMES)),
            ]);
            Schema::object(
                "FAQPage",
                vec![FieldSpec::required(
                    "faqs",
                    FieldKind::list_bounded(item, Some(MIN_FAQS), None),
                )
                .describe_as("Minimum 15 FAQs required")],
            )
        })
    }
}

/// A competing product found during comparison discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarProduct {
    pub brand: String,
    pub product_name: String,
    pub key_features: String,
    pub price: String,
    pub rating: f64,
    #[serde(default = "SimilarProduct::estimated")]
    pub rating_source: String,
    pub differentiators: String,
}

impl SimilarProduct {
    pub const ESTIMATED: &'static str = "estimated";

    fn estimated() -> String {
        Self::ESTIMATED.to_string()
    }

    /// Schema for the discovery answer: a list of exactly three competitors.
    pub fn list_schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            let item = FieldKind::Object(vec![
                FieldSpec::required("brand", FieldKind::String),
                FieldSpec::required("product_name", FieldKind::String),
                FieldSpec::required("key_features", FieldKind::String),
                FieldSpec::required("price", FieldKind::String),
                FieldSpec::required("rating", FieldKind::number_between(0.0, 5.0)),
                FieldSpec::optional("rating_source", FieldKind::String),
                FieldSpec::required("differentiators", FieldKind::String),
            ]);
            Schema::new(
                "SimilarProducts",
                FieldKind::list_bounded(
                    item,
                    Some(SIMILAR_PRODUCT_COUNT),
                    Some(SIMILAR_PRODUCT_COUNT),
                ),
            )
        })
    }
}

/// Fixed metadata describing how products are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonBasis {
    pub primary_factors: Vec<String>,
    pub assumptions: Vec<String>,
}

impl Default for ComparisonBasis {
    fn default() -> Self {
        Self {
            primary_factors: [
                "Active ingredient type",
                "Ingredient concentration",
                "Skin type suitability",
                "Price",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            assumptions: ["Ratings are estimated", "Brand reputation inferred"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Free-form analysis with a fixed key set.
///
/// Every key deserializes with an empty default, so a partial answer still
/// yields the full shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonAnalysis {
    pub comparison_summary: String,
    pub feature_comparison: Vec<Value>,
    pub price_analysis: Map<String, Value>,
    pub recommendations: Map<String, Value>,
    pub best_value_pick: Map<String, Value>,
}

impl ComparisonAnalysis {
    pub fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::object(
                "ComparisonAnalysis",
                vec![
                    FieldSpec::optional("comparison_summary", FieldKind::String),
                    FieldSpec::optional("feature_comparison", FieldKind::list(FieldKind::Any)),
                    FieldSpec::optional("price_analysis", FieldKind::AnyObject),
                    FieldSpec::optional("recommendations", FieldKind::AnyObject),
                    FieldSpec::optional("best_value_pick", FieldKind::AnyObject),
                ],
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductComparison {
    pub product_data: ParsedProduct,
    pub comparison_basis: ComparisonBasis,
    pub similar_products: Vec<SimilarProduct>,
    pub analysis: ComparisonAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parsed_product_from_partial_record() {
        let value = json!({ "product_name": "GlowBoost Vitamin C Serum", "price": "₹699" });
        let product: ParsedProduct = ParsedProduct::schema().conform(value).unwrap();
        assert_eq!(product.product_name, "GlowBoost Vitamin C Serum");
        assert_eq!(product.price_text(), Some("₹699"));
        assert_eq!(product.skin_type, None);
        assert!(!product.is_degraded());
    }

    #[test]
    fn test_parsed_product_rejects_non_string_fields() {
        let value = json!({ "product_name": "Serum", "price": 699 });
        assert!(ParsedProduct::schema().validate(&value).is_err());
        assert!(ParsedProduct::schema()
            .validate(&json!({ "price": "₹699" }))
            .is_err());
    }

    #[test]
    fn test_price_text_falls_back_to_inr_field() {
        let mut product = ParsedProduct::named("Serum");
        product.price = Some("  ".to_string());
        product.price_in_inr = Some("Rs 499".to_string());
        assert_eq!(product.price_text(), Some("Rs 499"));
    }

    #[test]
    fn test_degraded_record_serialization() {
        let product = ParsedProduct::degraded("some raw text");
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["product_name"], "Unknown");
        assert_eq!(value["raw_data"], "some raw text");

        let value = serde_json::to_value(ParsedProduct::named("Serum")).unwrap();
        assert!(value.get("raw_data").is_none());
    }

    #[test]
    fn test_faq_page_schema_requires_minimum() {
        let faq = json!({ "question": "q", "answer": "a", "category": "Usage" });
        let short = json!({ "faqs": vec![faq.clone(); MIN_FAQS - 1] });
        assert!(FaqPage::schema().validate(&short).is_err());

        let full = json!({ "faqs": vec![faq; MIN_FAQS] });
        let page: FaqPage = FaqPage::schema().conform(full).unwrap();
        assert_eq!(page.faqs.len(), MIN_FAQS);
        assert_eq!(page.faqs[0].category, FaqCategory::Usage);
    }

    #[test]
    fn test_similar_product_defaults_rating_source() {
        let item = json!({
            "brand": "Minimalist",
            "product_name": "Serum",
            "key_features": "HA",
            "price": "Rs 599",
            "rating": 4,
            "differentiators": "Fragrance-free"
        });
        let products: Vec<SimilarProduct> = SimilarProduct::list_schema()
            .conform(json!([item.clone(), item.clone(), item]))
            .unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].rating_source, "estimated");
        assert_eq!(products[0].rating, 4.0);
    }

    #[test]
    fn test_analysis_fills_missing_keys() {
        let analysis: ComparisonAnalysis =
            serde_json::from_value(json!({ "comparison_summary": "close call" })).unwrap();
        assert_eq!(analysis.comparison_summary, "close call");
        assert!(analysis.feature_comparison.is_empty());
        assert!(analysis.best_value_pick.is_empty());

        let value = serde_json::to_value(ComparisonAnalysis::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "comparison_summary": "",
                "feature_comparison": [],
                "price_analysis": {},
                "recommendations": {},
                "best_value_pick": {}
            })
        );
    }

    #[test]
    fn test_category_names_match_serde() {
        for category in FaqCategory::ALL {
            assert_eq!(
                serde_json::to_value(category).unwrap(),
                json!(category.as_str())
            );
        }
    }
}
