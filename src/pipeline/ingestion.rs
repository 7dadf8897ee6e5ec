use std::path::Path;
use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Read a CSV file into a table.
///
/// A missing file or unreadable content is logged and returned as an error;
/// callers decide whether the run can go on without it.
pub fn ingest_data(path: &Path) -> Result<Table> {
    info!("Starting data ingestion from {}", path.display());

    if !path.exists() {
        let err = PipelineError::MissingInput { path: path.to_path_buf() };
        error!("{}", err);
        return Err(err);
    }

    match Table::read_csv(path) {
        Ok(table) => {
            info!("Data ingestion from {} completed successfully", path.display());
            Ok(table)
        }
        Err(e) => {
            error!("{}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_file_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");

        let err = ingest_data(&path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput { .. }));
        assert!(err.is_ingestion_failure());
        assert!(err.to_string().starts_with("File not found: "));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "Crime ID,Crime type\n1,Burglary,extra\n").unwrap();

        let err = ingest_data(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
        assert!(err.to_string().starts_with("Error reading the CSV file "));
    }

    #[test]
    fn test_directory_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingest_data(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse { .. }));
    }

    #[test]
    fn test_reads_rows_and_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("street.csv");
        fs::write(&path, "Crime ID,Crime type\nabc,Burglary\n,Anti-social behaviour\n").unwrap();

        let table = ingest_data(&path).unwrap();
        assert_eq!(table.headers, vec!["Crime ID", "Crime type"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(1, 0), None);
    }
}
