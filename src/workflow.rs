use crate::config::Settings;
use crate::error::PipelineError;
use crate::generation::GenerationClient;
use crate::stage::{Operations, Stage};
use crate::stages;
use crate::state::{PipelineResult, PipelineState, ProductInput};
use crate::templates::Templates;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// What happened to a stage during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
}

impl StageRecord {
    fn completed(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
        }
    }

    fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
        }
    }
}

/// Drives the stages of one run in their fixed order.
///
/// Stages never fail the run; they degrade to fallbacks and record the
/// problem in the state. Every stage is offered exactly once, so the
/// returned trace always has one record per stage.
pub struct Workflow {
    client: GenerationClient,
    templates: Templates,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("model", &self.client.model())
            .field("templates", &self.templates)
            .finish()
    }
}

impl Workflow {
    pub fn new(client: GenerationClient, templates: Templates) -> Self {
        Self { client, templates }
    }

    pub fn builder() -> WorkflowBuilder {
        WorkflowBuilder::new()
    }

    /// Wires the HTTP-backed client and on-disk templates from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self, PipelineError> {
        Self::builder()
            .client(GenerationClient::from_settings(settings)?)
            .templates(Templates::load(&settings.paths.templates_dir))
            .build()
    }

    /// Runs the pipeline over `state` and returns the per-stage trace.
    pub async fn execute(&self, state: &mut PipelineState) -> Vec<StageRecord> {
        let mut trace = Vec::with_capacity(Stage::ORDER.len());
        let mut current = Some(Stage::Parse);

        while let Some(stage) = current {
            info!("Executing stage '{}'", stage);
            stages::execute(stage, &self.client, &self.templates, state).await;
            trace.push(StageRecord::completed(stage));

            let next = stage.next(state.operations());
            for skipped in stage.successors().take_while(|s| Some(*s) != next) {
                debug!("Skipping stage '{}'", skipped);
                trace.push(StageRecord::skipped(skipped));
            }
            current = next;
        }

        info!("Workflow finished in {:.2?}", state.elapsed());
        trace
    }

    /// Convenience entry point: one run from input to caller-facing result.
    pub async fn run(&self, input: ProductInput, operations: Operations) -> PipelineResult {
        let mut state = PipelineState::new(input, operations);
        self.execute(&mut state).await;
        state.into_result()
    }
}

#[derive(Debug, Default)]
pub struct WorkflowBuilder {
    client: Option<GenerationClient>,
    templates: Option<Templates>,
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: GenerationClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn templates(mut self, templates: Templates) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn build(self) -> Result<Workflow, PipelineError> {
        let client = self.client.ok_or_else(|| {
            PipelineError::Configuration("Generation client must be specified".to_string())
        })?;
        Ok(Workflow::new(client, self.templates.unwrap_or_default()))
    }
}
