use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::steps::{PipelineStep, ProcessingStep, ReportingStep, StagingStep, StepKind, StepResult};
use crate::categories::CategoryMap;
use crate::config::{ErrorHandlingStrategy, PipelineConfig};
use crate::error::Result;
use crate::logging::CRITICAL_TARGET;

/// Runs the staging, processing and reporting steps in order
pub struct PipelineOrchestrator {
    config: PipelineConfig,
}

impl PipelineOrchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the complete pipeline once.
    ///
    /// Step failures are recorded in the returned result. An `Err` means the
    /// run could not start at all (invalid configuration) and has been logged
    /// at CRITICAL.
    pub fn run(&self) -> Result<PipelineExecutionResult> {
        info!("Pipeline execution started");

        let categories = self.prepare()?;
        let steps: Vec<Box<dyn PipelineStep>> = StepKind::ALL
            .iter()
            .map(|kind| self.create_step(*kind, &categories))
            .collect();

        let strategy = self.config.error_handling;
        let mut execution_result = PipelineExecutionResult::new(strategy);

        for step in &steps {
            match step.execute(&self.config.paths) {
                Ok(step_result) => {
                    info!("Step '{}' completed: {}", step.step_name(), step_result.message);
                    execution_result.add_step_result(step_result);
                }
                Err(e) => {
                    let step_result = StepResult::failure(step.kind(), &e);
                    execution_result.add_step_result(step_result);
                    execution_result.success = false;

                    // Nothing downstream can run without both input files.
                    let inputs_missing = e.is_ingestion_failure() && step.kind() == StepKind::Staging;
                    if strategy == ErrorHandlingStrategy::StopOnFirstError || inputs_missing {
                        error!("Pipeline execution halted at step '{}': {}", step.step_name(), e);
                        break;
                    }
                    warn!("Step '{}' failed, continuing: {}", step.step_name(), e);
                }
            }
        }

        execution_result.complete();

        if execution_result.success {
            info!("Pipeline execution completed successfully");
        } else if strategy == ErrorHandlingStrategy::ContinueOnError {
            warn!("{} step(s) did not produce output", execution_result.failed_steps().len());
            info!("Pipeline execution completed successfully");
        }

        Ok(execution_result)
    }

    /// Run a single step on its own, reading its input from disk.
    pub fn run_step(&self, kind: StepKind) -> Result<StepResult> {
        info!("Running single step '{}'", kind);

        let categories = self.prepare()?;
        let step = self.create_step(kind, &categories);

        step.execute(&self.config.paths).map_err(|e| {
            error!("Step '{}' failed: {}", kind, e);
            e
        })
    }

    /// Validate configuration and build the outcome lookup. Failures here are
    /// logged at CRITICAL since no step can run.
    fn prepare(&self) -> Result<CategoryMap> {
        self.config
            .validate()
            .and_then(|_| self.config.category_map())
            .map_err(|e| {
                error!(target: CRITICAL_TARGET, "Pipeline execution failed: {}", e);
                e
            })
    }

    /// Create a step instance from configuration
    fn create_step(&self, kind: StepKind, categories: &CategoryMap) -> Box<dyn PipelineStep> {
        let step: Box<dyn PipelineStep> = match kind {
            StepKind::Staging => Box::new(StagingStep),
            StepKind::Processing => Box::new(ProcessingStep::new(categories.clone())),
            StepKind::Reporting => Box::new(ReportingStep),
        };
        step
    }
}

/// Result of executing a complete pipeline
#[derive(Debug, Clone, Serialize)]
pub struct PipelineExecutionResult {
    pub success: bool,
    pub error_handling: ErrorHandlingStrategy,
    pub step_results: Vec<StepResult>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineExecutionResult {
    pub fn new(error_handling: ErrorHandlingStrategy) -> Self {
        Self {
            success: true,
            error_handling,
            step_results: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn add_step_result(&mut self, result: StepResult) {
        self.step_results.push(result);
    }

    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }

    pub fn failed_steps(&self) -> Vec<StepKind> {
        self.step_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.step)
            .collect()
    }

    pub fn step_result(&self, kind: StepKind) -> Option<&StepResult> {
        self.step_results.iter().find(|r| r.step == kind)
    }
}
