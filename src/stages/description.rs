use super::pretty_json;
use crate::generation::GenerationClient;
use crate::model::{ParsedProduct, ProductDescription};
use crate::state::PipelineState;
use tracing::{error, info};

pub(super) async fn run(client: &GenerationClient, template: &str, state: &mut PipelineState) {
    let product = state.product();

    match client
        .generate_structured::<ProductDescription>(
            &description_prompt(template, &product),
            ProductDescription::schema(),
            None,
            None,
        )
        .await
    {
        Ok(description) => {
            info!("Description generated successfully");
            state.description = Some(description);
        }
        Err(e) => {
            error!("Description generation failed: {}", e);
            state.description = Some(ProductDescription::fallback(&product));
            state.record_error(format!("Description error: {}", e));
        }
    }
}

fn description_prompt(template: &str, product: &ParsedProduct) -> String {
    format!(
        "Using template and product data, create product description:

TEMPLATE:
{}

PRODUCT:
{}

Return JSON with: title, description, highlights (array), usage_instructions",
        template,
        pretty_json(product)
    )
}
