use super::pretty_json;
use crate::fallback::fallback_faqs;
use crate::generation::GenerationClient;
use crate::model::{FaqPage, ParsedProduct, MIN_FAQS};
use crate::state::PipelineState;
use tracing::{error, info};

const FAQ_MAX_TOKENS: u32 = 4096;

pub(super) async fn run(client: &GenerationClient, template: &str, state: &mut PipelineState) {
    let product = state.product();

    match client
        .generate_structured::<FaqPage>(
            &faq_prompt(template, &product),
            FaqPage::schema(),
            None,
            Some(FAQ_MAX_TOKENS),
        )
        .await
    {
        Ok(page) => {
            info!("Generated {} FAQs", page.faqs.len());
            state.faqs = Some(page.faqs);
        }
        Err(e) => {
            error!("FAQ generation failed: {}", e);
            state.faqs = Some(fallback_faqs(&product));
            state.record_error(format!("FAQ error: {}", e));
        }
    }
}

fn faq_prompt(template: &str, product: &ParsedProduct) -> String {
    format!(
        "Create MINIMUM {min} FAQs for this product with categories:

PRODUCT:
{product}

TEMPLATE:
{template}

Return JSON with array of FAQs. Each FAQ must have:
- question: string
- answer: string (3-5 sentences)
- category: one of [Informational, Safety, Usage, Purchase, Comparison]

MINIMUM {min} FAQs REQUIRED.",
        min = MIN_FAQS,
        product = pretty_json(product),
        template = template,
    )
}
