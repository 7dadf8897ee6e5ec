use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::{ingest_data, process_data, report_data, stage_data, StageOutput};
use crate::categories::CategoryMap;
use crate::config::PathsConfig;
use crate::error::{PipelineError, Result};

/// Common trait for all pipeline steps.
///
/// Every step reads its inputs from disk, so any step can be rerun on its own
/// against the files an earlier run left behind.
pub trait PipelineStep {
    /// Execute this step against the configured file locations
    fn execute(&self, paths: &PathsConfig) -> Result<StepResult>;

    /// Which step of the run this is
    fn kind(&self) -> StepKind;

    /// Get the name of this pipeline step
    fn step_name(&self) -> &'static str {
        self.kind().step_name()
    }
}

/// The steps of a full run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Staging,
    Processing,
    Reporting,
}

impl StepKind {
    pub const ALL: [StepKind; 3] = [StepKind::Staging, StepKind::Processing, StepKind::Reporting];

    pub fn step_name(&self) -> &'static str {
        match self {
            StepKind::Staging => "staging",
            StepKind::Processing => "processing",
            StepKind::Reporting => "reporting",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step_name())
    }
}

/// Result of executing a pipeline step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: StepKind,
    pub success: bool,
    pub rows_read: usize,
    pub rows_written: usize,
    pub output_file: Option<PathBuf>,
    pub digest: Option<String>,
    pub message: String,
}

impl StepResult {
    pub fn success(step: StepKind, rows_read: usize, output: StageOutput) -> Self {
        Self {
            step,
            success: true,
            rows_read,
            rows_written: output.rows,
            message: format!("wrote {} rows to {}", output.rows, output.path.display()),
            output_file: Some(output.path),
            digest: Some(output.digest),
        }
    }

    pub fn failure(step: StepKind, error: &PipelineError) -> Self {
        Self {
            step,
            success: false,
            rows_read: 0,
            rows_written: 0,
            output_file: None,
            digest: None,
            message: error.to_string(),
        }
    }
}

/// Ingest the street and outcomes files, then stage them
pub struct StagingStep;

impl PipelineStep for StagingStep {
    fn execute(&self, paths: &PathsConfig) -> Result<StepResult> {
        // Both inputs are read (and any failure logged) before giving up.
        let primary = ingest_data(&paths.raw_data_path());
        let outcomes = ingest_data(&paths.outcomes_data_path());
        let (primary, outcomes) = (primary?, outcomes?);

        let output = stage_data(&primary, &outcomes, &paths.staged_data_path())?;
        Ok(StepResult::success(StepKind::Staging, primary.len(), output))
    }

    fn kind(&self) -> StepKind {
        StepKind::Staging
    }
}

/// Re-read the staged file and derive outcome columns
pub struct ProcessingStep {
    categories: CategoryMap,
}

impl ProcessingStep {
    pub fn new(categories: CategoryMap) -> Self {
        Self { categories }
    }
}

impl PipelineStep for ProcessingStep {
    fn execute(&self, paths: &PathsConfig) -> Result<StepResult> {
        let staged = ingest_data(&paths.staged_data_path())?;
        let rows_read = staged.len();
        let output = process_data(staged, &paths.processed_data_path(), &self.categories)?;
        Ok(StepResult::success(StepKind::Processing, rows_read, output))
    }

    fn kind(&self) -> StepKind {
        StepKind::Processing
    }
}

/// Re-read the processed file and write the aggregate report
pub struct ReportingStep;

impl PipelineStep for ReportingStep {
    fn execute(&self, paths: &PathsConfig) -> Result<StepResult> {
        let processed = ingest_data(&paths.processed_data_path())?;
        let output = report_data(&processed, &paths.reporting_data_path())?;
        Ok(StepResult::success(StepKind::Reporting, processed.len(), output))
    }

    fn kind(&self) -> StepKind {
        StepKind::Reporting
    }
}
