use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::categories::{CategoryLists, CategoryMap};
use crate::constants;
use crate::error::{PipelineError, Result};
use crate::logging;

/// Configuration for a complete pipeline execution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub categories: CategoryLists,
    pub error_handling: ErrorHandlingStrategy,
}

/// Input and output file locations. Relative file names resolve against `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub raw_data: PathBuf,
    pub outcomes_data: PathBuf,
    pub staged_data: PathBuf,
    pub processed_data: PathBuf,
    pub reporting_data: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            raw_data: PathBuf::from(constants::DEFAULT_RAW_DATA_FILE),
            outcomes_data: PathBuf::from(constants::DEFAULT_OUTCOMES_DATA_FILE),
            staged_data: PathBuf::from(constants::DEFAULT_STAGED_DATA_FILE),
            processed_data: PathBuf::from(constants::DEFAULT_PROCESSED_DATA_FILE),
            reporting_data: PathBuf::from(constants::DEFAULT_REPORTING_DATA_FILE),
        }
    }
}

impl PathsConfig {
    /// All paths under a single data directory, with the default file names.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.data_dir.join(path)
    }

    pub fn raw_data_path(&self) -> PathBuf {
        self.resolve(&self.raw_data)
    }

    pub fn outcomes_data_path(&self) -> PathBuf {
        self.resolve(&self.outcomes_data)
    }

    pub fn staged_data_path(&self) -> PathBuf {
        self.resolve(&self.staged_data)
    }

    pub fn processed_data_path(&self) -> PathBuf {
        self.resolve(&self.processed_data)
    }

    pub fn reporting_data_path(&self) -> PathBuf {
        self.resolve(&self.reporting_data)
    }
}

/// Where and how run events are logged. A relative `file` resolves against
/// `paths.data_dir`, like the data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub time_format: String,
    pub level: String,
    /// Echo events to stdout as well as the log file
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(constants::DEFAULT_LOG_FILE),
            time_format: constants::DEFAULT_LOG_TIME_FORMAT.to_string(),
            level: constants::DEFAULT_LOG_LEVEL.to_string(),
            console: true,
        }
    }
}

/// Strategy for handling a failed step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorHandlingStrategy {
    /// Stop pipeline execution on first failed step
    #[default]
    StopOnFirstError,
    /// Run every step regardless, each one reading whatever its input file holds
    ContinueOnError,
}

impl PipelineConfig {
    /// Defaults with every data file under `data_dir` and the log beside them.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig::in_dir(data_dir),
            ..Self::default()
        }
    }

    /// Log file location after resolving against `paths.data_dir`.
    pub fn log_file_path(&self) -> PathBuf {
        self.paths.resolve(&self.logging.file)
    }

    /// Logging settings ready for `init_logging`, with the file path resolved.
    pub fn resolved_logging(&self) -> LoggingConfig {
        LoggingConfig {
            file: self.log_file_path(),
            ..self.logging.clone()
        }
    }

    /// Load configuration from a TOML file. Omitted keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build the outcome lookup used by the processing step.
    pub fn category_map(&self) -> Result<CategoryMap> {
        CategoryMap::from_lists(&self.categories)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        let files = [
            ("raw_data", &self.paths.raw_data),
            ("outcomes_data", &self.paths.outcomes_data),
            ("staged_data", &self.paths.staged_data),
            ("processed_data", &self.paths.processed_data),
            ("reporting_data", &self.paths.reporting_data),
            ("logging.file", &self.logging.file),
        ];
        for (key, path) in files {
            if path.as_os_str().is_empty() {
                return Err(PipelineError::Config(format!("'{}' must not be empty", key)));
            }
        }

        let inputs = [self.paths.raw_data_path(), self.paths.outcomes_data_path()];
        let outputs = [
            self.paths.staged_data_path(),
            self.paths.processed_data_path(),
            self.paths.reporting_data_path(),
        ];
        for input in &inputs {
            if outputs.contains(input) {
                return Err(PipelineError::Config(format!(
                    "input '{}' would be overwritten by an output",
                    input.display()
                )));
            }
        }
        for (i, output) in outputs.iter().enumerate() {
            if outputs[i + 1..].contains(output) {
                return Err(PipelineError::Config(format!(
                    "output '{}' is written by more than one step",
                    output.display()
                )));
            }
        }

        let log_file = self.log_file_path();
        if inputs.contains(&log_file) || outputs.contains(&log_file) {
            return Err(PipelineError::Config(format!(
                "log file '{}' is also a data file",
                log_file.display()
            )));
        }

        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            PipelineError::Config(format!("invalid log level '{}': {}", self.logging.level, e))
        })?;
        logging::check_time_format(&self.logging.time_format)?;

        self.category_map()?;
        Ok(())
    }
}
