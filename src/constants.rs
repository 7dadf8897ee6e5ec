/// Column and file name constants shared by the pipeline stages.
/// These match the police.uk street and outcomes CSV exports.

// Input columns
pub const CRIME_ID: &str = "Crime ID";
pub const CRIME_TYPE: &str = "Crime type";
pub const LAST_OUTCOME_CATEGORY: &str = "Last outcome category";
pub const OUTCOME_TYPE: &str = "Outcome type";
pub const REPORTED_BY: &str = "Reported by";
pub const CONTEXT: &str = "Context";
pub const LOCATION: &str = "Location";

// Derived columns
pub const FINAL_OUTCOME: &str = "Final Outcome";
pub const BROAD_OUTCOME_CATEGORY: &str = "Broad Outcome Category";
pub const COUNT: &str = "Count";

/// Columns removed from the primary table during staging
pub const STAGING_DROPPED_COLUMNS: [&str; 3] = [REPORTED_BY, CONTEXT, LOCATION];

// Default file locations, relative to the data directory
pub const DEFAULT_DATA_DIR: &str = "./";
pub const DEFAULT_LOG_FILE: &str = "pipeline.log";
pub const DEFAULT_RAW_DATA_FILE: &str = "2022-01-cheshire-street.csv";
pub const DEFAULT_OUTCOMES_DATA_FILE: &str = "2022-01-cheshire-outcomes.csv";
pub const DEFAULT_STAGED_DATA_FILE: &str = "staged_cheshire_street.csv";
pub const DEFAULT_PROCESSED_DATA_FILE: &str = "processed_cheshire_street.csv";
pub const DEFAULT_REPORTING_DATA_FILE: &str = "reporting_cheshire_street.csv";

/// Timestamp layout for log lines
pub const DEFAULT_LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DEFAULT_LOG_LEVEL: &str = "info";
