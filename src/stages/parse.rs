use crate::generation::GenerationClient;
use crate::model::ParsedProduct;
use crate::state::{PipelineState, ProductInput};
use serde_json::Value;
use tracing::{error, info, warn};

pub(super) async fn run(client: &GenerationClient, state: &mut PipelineState) {
    let input = state.input().clone();

    if let ProductInput::Structured(map) = &input {
        match ParsedProduct::schema().conform::<ParsedProduct>(Value::Object(map.clone())) {
            Ok(mut product) => {
                product.raw_data = None;
                info!("Using structured input for {}", product.product_name);
                state.parsed_product = Some(product);
                return;
            }
            Err(e) => warn!("Structured input failed validation, extracting instead: {}", e),
        }
    }

    let raw = input.raw_text();
    match client
        .generate_structured::<ParsedProduct>(&extraction_prompt(&raw), ParsedProduct::schema(), None, None)
        .await
    {
        Ok(mut product) => {
            product.raw_data = None;
            info!("Parsed product: {}", product.product_name);
            state.parsed_product = Some(product);
        }
        Err(e) => {
            error!("Parser failed: {}", e);
            state.parsed_product = Some(ParsedProduct::degraded(raw));
            state.record_error(format!("Parser error: {}", e));
        }
    }
}

fn extraction_prompt(raw: &str) -> String {
    format!(
        "Extract product information from text and return as JSON:

{}

Return JSON with fields: product_name, concentration, skin_type, key_ingredients, benefits, how_to_use, side_effects, price

Ensure all string fields are present (use empty string if not found).",
        raw
    )
}
