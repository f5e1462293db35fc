//! Stage executors.
//!
//! Every executor reads what it needs from [`PipelineState`], writes only its
//! own output fields and never fails: generation problems are turned into
//! the stage's fallback and recorded in `last_error`.

mod comparison;
mod description;
mod faq;
mod parse;

use crate::generation::GenerationClient;
use crate::stage::Stage;
use crate::state::PipelineState;
use crate::templates::Templates;
use serde::Serialize;

/// Runs one stage against `state`.
pub async fn execute(
    stage: Stage,
    client: &GenerationClient,
    templates: &Templates,
    state: &mut PipelineState,
) {
    let template = templates.for_stage(stage).unwrap_or_default();
    match stage {
        Stage::Parse => parse::run(client, state).await,
        Stage::Description => description::run(client, template, state).await,
        Stage::Comparison => comparison::run(client, template, state).await,
        Stage::Faq => faq::run(client, template, state).await,
    }
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::mock::ScriptedService;
    use crate::model::ParsedProduct;
    use crate::stage::Operations;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_each_stage_gets_its_own_template() {
        let templates = Templates {
            description: "DESCRIPTION TEMPLATE".to_string(),
            comparison: "COMPARISON TEMPLATE".to_string(),
            faq: "FAQ TEMPLATE".to_string(),
        };

        for (stage, expected) in [
            (Stage::Description, "DESCRIPTION TEMPLATE"),
            (Stage::Faq, "FAQ TEMPLATE"),
        ] {
            let service = Arc::new(ScriptedService::new());
            let mut state = PipelineState::new("x".into(), Operations::all());
            state.parsed_product = Some(ParsedProduct::named("Serum"));

            execute(stage, &testing::client(&service), &templates, &mut state).await;

            let prompt = service.requests()[0].prompt().to_string();
            assert!(prompt.contains(expected), "{} prompt", stage);
            for other in ["DESCRIPTION TEMPLATE", "COMPARISON TEMPLATE", "FAQ TEMPLATE"] {
                if other != expected {
                    assert!(!prompt.contains(other), "{} prompt", stage);
                }
            }
        }
    }
}
