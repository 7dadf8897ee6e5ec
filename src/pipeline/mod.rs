// Pipeline stages and orchestration

pub mod ingestion;
pub mod orchestrator;
pub mod processing;
pub mod reporting;
pub mod staging;
pub mod steps;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::table::Table;

/// A table a stage has written to disk
#[derive(Debug, Clone, Serialize)]
pub struct StageOutput {
    pub path: PathBuf,
    pub rows: usize,
    /// SHA-256 of the file contents, hex encoded
    pub digest: String,
}

pub(crate) fn write_output(table: &Table, path: &Path) -> Result<StageOutput> {
    let digest = table.write_csv(path)?;
    info!("Wrote {} rows to {} (sha256 {})", table.len(), path.display(), digest);
    Ok(StageOutput {
        path: path.to_path_buf(),
        rows: table.len(),
        digest,
    })
}

// Re-export key types for convenience
pub use ingestion::ingest_data;
pub use orchestrator::{PipelineExecutionResult, PipelineOrchestrator};
pub use processing::process_data;
pub use reporting::report_data;
pub use staging::stage_data;
pub use steps::{PipelineStep, StepKind, StepResult};
