pub mod categories;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod table;

pub use categories::{BroadCategory, CategoryLists, CategoryMap};
pub use config::{ErrorHandlingStrategy, LoggingConfig, PathsConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineExecutionResult, PipelineOrchestrator, StepKind, StepResult};
pub use table::Table;
