use crate::error::PipelineError;
use crate::state::ProductInput;
use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_NAME_CHARS: usize = 30;

/// Writes run inputs and per-operation results as timestamped JSON files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    inputs_dir: PathBuf,
    outputs_dir: PathBuf,
}

impl SnapshotStore {
    /// Uses `<data_dir>/inputs` and `<data_dir>/outputs`, creating both.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let data_dir = data_dir.as_ref();
        let store = Self {
            inputs_dir: data_dir.join("inputs"),
            outputs_dir: data_dir.join("outputs"),
        };
        fs::create_dir_all(&store.inputs_dir)?;
        fs::create_dir_all(&store.outputs_dir)?;
        Ok(store)
    }

    /// Redirects result files to `dir`, creating it.
    pub fn with_outputs_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        self.outputs_dir = dir.into();
        fs::create_dir_all(&self.outputs_dir)?;
        Ok(self)
    }

    /// Saves the raw input as `input_<name>_<timestamp>.json`.
    pub fn save_input(&self, input: &ProductInput) -> Result<PathBuf, PipelineError> {
        self.save_input_at(input, Local::now())
    }

    /// Saves one operation's results as
    /// `output_<operation>_<name>_<timestamp>.json`.
    pub fn save_output<T: Serialize>(
        &self,
        operation: &str,
        product_name: &str,
        results: &T,
    ) -> Result<PathBuf, PipelineError> {
        self.save_output_at(operation, product_name, results, Local::now())
    }

    fn save_input_at(
        &self,
        input: &ProductInput,
        now: DateTime<Local>,
    ) -> Result<PathBuf, PipelineError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let name = match input {
            ProductInput::Structured(_) => file_safe(input.product_name().unwrap_or("unknown")),
            ProductInput::Text(_) => "raw_input".to_string(),
        };
        let path = self
            .inputs_dir
            .join(format!("input_{}_{}.json", name, timestamp));

        write_json(
            &path,
            &json!({ "timestamp": timestamp, "product_data": input }),
        )?;
        info!("Input saved: {}", path.display());
        Ok(path)
    }

    fn save_output_at<T: Serialize>(
        &self,
        operation: &str,
        product_name: &str,
        results: &T,
        now: DateTime<Local>,
    ) -> Result<PathBuf, PipelineError> {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let name: String = file_safe(product_name).chars().take(MAX_NAME_CHARS).collect();
        let path = self
            .outputs_dir
            .join(format!("output_{}_{}_{}.json", operation, name, timestamp));

        write_json(
            &path,
            &json!({
                "timestamp": timestamp,
                "product_name": product_name,
                "operation": operation,
                "results": serde_json::to_value(results)?,
            }),
        )?;
        info!("Output saved: {}", path.display());
        Ok(path)
    }
}

/// Keeps letters, digits, `-` and `.`; everything else, path separators
/// included, becomes `_`.
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn write_json(path: &Path, value: &Value) -> Result<(), PipelineError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
