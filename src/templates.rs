use crate::stage::Stage;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "Create a professional product description.";
pub const DEFAULT_COMPARISON_TEMPLATE: &str = "Compare products based on features and price.";
pub const DEFAULT_FAQ_TEMPLATE: &str = "Generate comprehensive FAQs with categories.";

/// Prompt templates for the generating stages.
///
/// Template text is opaque; it is pasted into the stage prompt as-is. Every
/// template has a fixed default so a missing file never stops a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub description: String,
    pub comparison: String,
    pub faq: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION_TEMPLATE.to_string(),
            comparison: DEFAULT_COMPARISON_TEMPLATE.to_string(),
            faq: DEFAULT_FAQ_TEMPLATE.to_string(),
        }
    }
}

impl Templates {
    /// Reads templates from `dir`, keeping the default for any file that
    /// is missing or unreadable.
    pub fn load(dir: &Path) -> Self {
        Self {
            description: read_or(dir, "product_description.txt", DEFAULT_DESCRIPTION_TEMPLATE),
            comparison: read_or(dir, "comparison_template.txt", DEFAULT_COMPARISON_TEMPLATE),
            faq: read_or(dir, "faq_template.txt", DEFAULT_FAQ_TEMPLATE),
        }
    }

    /// Template for a stage; `parse` has none.
    pub fn for_stage(&self, stage: Stage) -> Option<&str> {
        match stage {
            Stage::Parse => None,
            Stage::Description => Some(&self.description),
            Stage::Comparison => Some(&self.comparison),
            Stage::Faq => Some(&self.faq),
        }
    }
}

fn read_or(dir: &Path, file: &str, default: &str) -> String {
    let path = dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            debug!("Loaded template {}", path.display());
            text
        }
        Err(e) => {
            warn!("Could not load template {}: {}", path.display(), e);
            default.to_string()
        }
    }
}
