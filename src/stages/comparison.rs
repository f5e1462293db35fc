//! Two-step comparison: discover three competitors, then analyze them
//! against the parsed product.

use super::pretty_json;
use crate::error::GenerationError;
use crate::fallback::fallback_products;
use crate::generation::GenerationClient;
use crate::model::{
    ComparisonAnalysis, ComparisonBasis, ParsedProduct, ProductComparison, SimilarProduct,
};
use crate::state::PipelineState;
use tracing::{error, info, warn};

const DISCOVERY_TEMPERATURE: f32 = 0.6;
const ANALYSIS_TEMPERATURE: f32 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 2048;

pub(super) async fn run(client: &GenerationClient, template: &str, state: &mut PipelineState) {
    let product = state.product();

    let similar_products = match discover(client, &product).await {
        Ok(products) => {
            info!("Found {} similar products", products.len());
            products
        }
        Err(e) => {
            warn!("Similar product search failed, using fallback: {}", e);
            state.record_error(format!("Comparison discovery error: {}", e));
            fallback_products(product.price_text())
        }
    };
    state.similar_products = Some(similar_products.clone());

    let analysis = match analyze(client, template, &product, &similar_products).await {
        Ok(analysis) => {
            info!("Comparison completed successfully");
            analysis
        }
        Err(e) => {
            error!("Comparison failed: {}", e);
            state.record_error(format!("Comparison error: {}", e));
            ComparisonAnalysis::default()
        }
    };

    state.comparison = Some(ProductComparison {
        product_data: product,
        comparison_basis: ComparisonBasis::default(),
        similar_products,
        analysis,
    });
}

async fn discover(
    client: &GenerationClient,
    product: &ParsedProduct,
) -> Result<Vec<SimilarProduct>, GenerationError> {
    let value = client
        .generate_json(&discovery_prompt(product), Some(DISCOVERY_TEMPERATURE), None)
        .await?;
    let products: Vec<SimilarProduct> = SimilarProduct::list_schema().conform(value)?;
    // ratings are never measured, whatever source the model claims
    Ok(products
        .into_iter()
        .map(|product| SimilarProduct {
            rating_source: SimilarProduct::ESTIMATED.to_string(),
            ..product
        })
        .collect())
}

async fn analyze(
    client: &GenerationClient,
    template: &str,
    product: &ParsedProduct,
    similar_products: &[SimilarProduct],
) -> Result<ComparisonAnalysis, GenerationError> {
    let prompt = analysis_prompt(template, product, similar_products);
    let value = client
        .generate_json(&prompt, Some(ANALYSIS_TEMPERATURE), Some(ANALYSIS_MAX_TOKENS))
        .await?;
    Ok(ComparisonAnalysis::schema().conform(value)?)
}

fn discovery_prompt(product: &ParsedProduct) -> String {
    format!(
        r#"You are a skincare market research expert.

ORIGINAL PRODUCT
Name: {name}
Ingredients: {ingredients}
Price: {price}

TASK
Return EXACTLY 3 real competing products from the Indian market (2025).

RULES
- Different brands
- JSON ONLY
- No markdown
- Ratings must be ESTIMATED

JSON FORMAT (return array of 3 objects):
[
  {{
    "brand": "Brand Name",
    "product_name": "Product Name",
    "key_features": "Key features description",
    "price": "Rs 699",
    "rating": 4.3,
    "rating_source": "estimated",
    "differentiators": "What makes it different"
  }}
]"#,
        name = product.product_name,
        ingredients = product.key_ingredients.as_deref().unwrap_or_default(),
        price = product.price_text().unwrap_or_default(),
    )
}

fn analysis_prompt(
    template: &str,
    product: &ParsedProduct,
    similar_products: &[SimilarProduct],
) -> String {
    format!(
        "Compare the ORIGINAL product with the ALTERNATIVE products.

ORIGINAL PRODUCT:
{product}

ALTERNATIVE PRODUCTS:
{alternatives}

TEMPLATE:
{template}

Return JSON with:
- comparison_summary: string
- feature_comparison: array of comparison points
- price_analysis: object with price insights
- recommendations: object with recommendation
- best_value_pick: object with best value selection

IMPORTANT:
- Ratings are ESTIMATED
- Do NOT invent external data
- No markdown",
        product = pretty_json(product),
        alternatives = pretty_json(&similar_products),
        template = template,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::ScriptedService;
    use crate::stage::Operations;
    use crate::stages::testing::client;
    use serde_json::json;
    use std::sync::Arc;

    fn parsed_state(price: &str) -> PipelineState {
        let mut state = PipelineState::new("x".into(), Operations::from_names(["comparison"]));
        state.parsed_product = Some(ParsedProduct::named("GlowBoost").with_price(price));
        state
    }

    fn competitors(count: usize) -> String {
        let items: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "brand": format!("Brand {}", i),
                    "product_name": format!("Serum {}", i),
                    "key_features": "Niacinamide",
                    "price": "Rs 599",
                    "rating": 4.1,
                    "differentiators": "Cheaper"
                })
            })
            .collect();
        format!("```json\n{}\n```", json!(items))
    }

    const ANALYSIS: &str = r#"{"comparison_summary": "GlowBoost leads on concentration.", "feature_comparison": [{"feature": "Vitamin C"}], "price_analysis": {"cheapest": "Serum 0"}, "recommendations": {"oily": "GlowBoost"}, "best_value_pick": {"product": "Serum 0"}}"#;

    #[tokio::test]
    async fn test_discovery_and_analysis() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response(competitors(3))
                .with_response(ANALYSIS),
        );
        let mut state = parsed_state("₹699");

        run(&client(&service), "Focus on price.", &mut state).await;

        let comparison = state.comparison.unwrap();
        assert_eq!(comparison.product_data.product_name, "GlowBoost");
        assert_eq!(comparison.comparison_basis, ComparisonBasis::default());
        assert_eq!(comparison.similar_products.len(), 3);
        assert_eq!(comparison.similar_products[0].rating_source, SimilarProduct::ESTIMATED);
        assert_eq!(comparison.analysis.comparison_summary, "GlowBoost leads on concentration.");
        assert_eq!(state.similar_products.unwrap(), comparison.similar_products);
        assert!(state.last_error.is_none());

        let requests = service.requests();
        assert_eq!(requests[0].temperature, DISCOVERY_TEMPERATURE);
        assert!(requests[0].prompt().contains("Price: ₹699"));
        assert_eq!(requests[1].max_tokens, ANALYSIS_MAX_TOKENS);
        assert!(requests[1].prompt().contains("Focus on price."));
        assert!(requests[1].prompt().contains("Brand 2"));
    }

    #[tokio::test]
    async fn test_claimed_rating_source_is_replaced() {
        let items = json!([
            { "brand": "A", "product_name": "A1", "key_features": "k", "price": "Rs 1", "rating": 4.0, "rating_source": "Amazon reviews", "differentiators": "d" },
            { "brand": "B", "product_name": "B1", "key_features": "k", "price": "Rs 2", "rating": 4.1, "rating_source": null, "differentiators": "d" },
            { "brand": "C", "product_name": "C1", "key_features": "k", "price": "Rs 3", "rating": 4.2, "rating_source": "estimated", "differentiators": "d" }
        ]);
        let service = Arc::new(
            ScriptedService::new()
                .with_response(items.to_string())
                .with_response(ANALYSIS),
        );
        let mut state = parsed_state("₹699");

        run(&client(&service), "", &mut state).await;

        let similar = state.similar_products.unwrap();
        assert_eq!(similar[0].brand, "A");
        assert!(similar
            .iter()
            .all(|p| p.rating_source == SimilarProduct::ESTIMATED));
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_wrong_competitor_count_uses_fallback() {
        for count in [2, 4] {
            let service = Arc::new(
                ScriptedService::new()
                    .with_response(competitors(count))
                    .with_response(ANALYSIS),
            );
            let mut state = parsed_state("Rs 800");

            run(&client(&service), "", &mut state).await;

            let similar = state.similar_products.unwrap();
            assert_eq!(similar, fallback_products(Some("Rs 800")));
            let prices: Vec<_> = similar.iter().map(|p| p.price.as_str()).collect();
            assert_eq!(prices, ["Rs 750", "Rs 800", "Rs 950"]);
            // analysis still ran against the fallback set
            assert_eq!(service.calls(), 2);
            assert!(service.requests()[1].prompt().contains("Minimalist"));
        }
    }

    #[tokio::test]
    async fn test_undecodable_discovery_uses_fallback() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response("Here are three great serums!")
                .with_response(ANALYSIS),
        );
        let mut state = parsed_state("₹699");

        run(&client(&service), "", &mut state).await;

        let comparison = state.comparison.unwrap();
        assert_eq!(comparison.similar_products, fallback_products(Some("₹699")));
        assert_eq!(comparison.analysis.best_value_pick["product"], "Serum 0");
        assert!(state
            .last_error
            .unwrap()
            .starts_with("Comparison discovery error:"));
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_shape() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response(competitors(3))
                .with_response("not json"),
        );
        let mut state = parsed_state("₹699");

        run(&client(&service), "", &mut state).await;

        let comparison = state.comparison.unwrap();
        assert_eq!(comparison.analysis, ComparisonAnalysis::default());

        let value = serde_json::to_value(&comparison.analysis).unwrap();
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
        assert!(state.last_error.unwrap().starts_with("Comparison error:"));
    }

    #[tokio::test]
    async fn test_null_analysis_keys_keep_the_rest() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response(competitors(3))
                .with_response(
                    r#"{"comparison_summary": null, "feature_comparison": null, "price_analysis": {"cheapest": "Serum 1"}, "best_value_pick": {"product": "Serum 1"}}"#,
                ),
        );
        let mut state = parsed_state("₹699");

        run(&client(&service), "", &mut state).await;

        let analysis = state.comparison.unwrap().analysis;
        assert_eq!(analysis.comparison_summary, "");
        assert!(analysis.feature_comparison.is_empty());
        assert_eq!(analysis.price_analysis["cheapest"], "Serum 1");
        assert_eq!(analysis.best_value_pick["product"], "Serum 1");
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_partial_analysis_is_filled() {
        let service = Arc::new(
            ScriptedService::new()
                .with_response(competitors(3))
                .with_response(r#"{"comparison_summary": "Close call."}"#),
        );
        let mut state = parsed_state("₹699");

        run(&client(&service), "", &mut state).await;

        let analysis = state.comparison.unwrap().analysis;
        assert_eq!(analysis.comparison_summary, "Close call.");
        assert!(analysis.feature_comparison.is_empty());
        assert!(analysis.recommendations.is_empty());
    }
}
