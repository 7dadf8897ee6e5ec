use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("Error reading the CSV file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column already present: {0}")]
    DuplicateColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// True for failures raised while reading a stage's input file.
    pub fn is_ingestion_failure(&self) -> bool {
        matches!(self, PipelineError::MissingInput { .. } | PipelineError::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
