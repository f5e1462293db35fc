use anyhow::{bail, Context as _};
use clap::Parser;
use product_pipeline::{
    telemetry, Operations, PipelineResult, ProductInput, Settings, SnapshotStore, Stage, Workflow,
    MIN_FAQS,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Generate product descriptions, competitor comparisons and FAQs
#[derive(Parser, Debug)]
#[command(name = "product-pipeline")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON (or plain text) file with product data
    #[arg(long)]
    input: Option<PathBuf>,

    /// Comma-separated operations: description, comparison, faq
    #[arg(long, default_value = "description,comparison,faq")]
    operations: String,

    /// Use the built-in sample product
    #[arg(long)]
    sample: bool,

    /// Directory for result files (default: <data_dir>/outputs)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Settings file read instead of config/local
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(cli.config.as_deref())?;
    telemetry::init(&settings.logging)?;

    let input = match (&cli.input, cli.sample) {
        (Some(path), false) => load_input(path)?,
        _ => {
            info!("Using sample product data");
            sample_product(&settings.paths.data_dir)
        }
    };

    let operations = Operations::from_names(cli.operations.split(','));
    if operations.is_empty() {
        error!("No valid operations specified. Use: description, comparison, faq");
        bail!("no valid operations in '{}'", cli.operations);
    }
    info!(
        "Product: {} | Operations: {}",
        input.product_name().unwrap_or("Unknown"),
        operations.names().join(", ")
    );

    let workflow = Workflow::from_settings(&settings)?;

    let store = open_store(&settings.paths.data_dir, cli.output_dir.as_deref());
    if let Some(store) = &store {
        if let Err(e) = store.save_input(&input) {
            warn!("Could not save input snapshot: {}", e);
        }
    }

    let result = workflow.run(input, operations.clone()).await;

    if let Some(e) = &result.error {
        warn!("Run finished with an error: {}", e);
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    report_faq_count(&result);
    if let Some(store) = &store {
        save_outputs(store, &operations, &result);
    }
    Ok(())
}

/// Snapshots are best effort: a store that cannot be opened only disables
/// them.
fn open_store(data_dir: &Path, output_dir: Option<&Path>) -> Option<SnapshotStore> {
    let store = SnapshotStore::new(data_dir).and_then(|store| match output_dir {
        Some(dir) => store.with_outputs_dir(dir),
        None => Ok(store),
    });
    match store {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Snapshots disabled: {}", e);
            None
        }
    }
}

fn load_input(path: &Path) -> anyhow::Result<ProductInput> {
    info!("Loading product data from: {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;

    Ok(match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(mut map)) => match map.remove("product_data") {
            Some(inner) => ProductInput::from(inner),
            None => ProductInput::Structured(map),
        },
        Ok(other) => ProductInput::from(other),
        Err(_) => ProductInput::Text(text),
    })
}

fn report_faq_count(result: &PipelineResult) {
    if let Some(faqs) = &result.faqs {
        info!("Generated {} FAQs (minimum {} required)", faqs.len(), MIN_FAQS);
        if faqs.len() < MIN_FAQS {
            warn!("FAQ count is below minimum requirement");
        }
    }
}

/// Saves each requested artifact under the parsed product name.
fn save_outputs(store: &SnapshotStore, operations: &Operations, result: &PipelineResult) {
    let product_name = result.product_data.product_name.as_str();

    for stage in operations.iter() {
        let artifact = match stage {
            Stage::Description => result
                .description
                .as_ref()
                .map(|description| json!({ "description": description })),
            Stage::Comparison => result
                .comparison
                .as_ref()
                .map(|comparison| json!({ "comparison": comparison })),
            Stage::Faq => result.faqs.as_ref().map(|faqs| json!({ "faqs": faqs })),
            Stage::Parse => None,
        };
        if let Some(artifact) = artifact {
            if let Err(e) = store.save_output(stage.name(), product_name, &artifact) {
                warn!("Could not save {} snapshot: {}", stage, e);
            }
        }
    }
}

/// `<data_dir>/sample_product.json` when readable, else the built-in record.
fn sample_product(data_dir: &Path) -> ProductInput {
    let path = data_dir.join("sample_product.json");
    match std::fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|text| Ok(serde_json::from_str::<Value>(&text)?))
    {
        Ok(value @ Value::Object(_)) => return ProductInput::from(value),
        Ok(_) => warn!("Could not load sample data: {} is not a JSON object", path.display()),
        Err(e) => warn!("Could not load sample data: {}", e),
    }
    builtin_sample()
}

fn builtin_sample() -> ProductInput {
    ProductInput::from(json!({
        "product_name": "GlowBoost Vitamin C Serum",
        "concentration": "10% Vitamin C",
        "skin_type": "Oily, Combination",
        "key_ingredients": "Vitamin C, Hyaluronic Acid",
        "benefits": "Brightening, Fades dark spots",
        "how_to_use": "Apply 2-3 drops in the morning before sunscreen",
        "side_effects": "Mild tingling for sensitive skin",
        "price": "₹699"
    }))
}
