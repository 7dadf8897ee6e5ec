use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info};

use super::{write_output, StageOutput};
use crate::constants::{CRIME_ID, OUTCOME_TYPE, STAGING_DROPPED_COLUMNS};
use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Left join `Outcome type` from the outcomes table onto the primary table by `Crime ID`.
///
/// Every primary row is kept. Rows with no matching outcome, or with a null
/// `Crime ID`, get a null `Outcome type`. If an ID repeats in the outcomes
/// table the first occurrence is used.
pub fn merge_outcomes(primary: &Table, outcomes: &Table) -> Result<Table> {
    let id_idx = primary.require_column(CRIME_ID)?;
    if primary.column_index(OUTCOME_TYPE).is_some() {
        return Err(PipelineError::DuplicateColumn(OUTCOME_TYPE.to_string()));
    }
    let outcome_id_idx = outcomes.require_column(CRIME_ID)?;
    let outcome_type_idx = outcomes.require_column(OUTCOME_TYPE)?;

    let mut outcome_by_id: HashMap<&str, &str> = HashMap::new();
    for row in 0..outcomes.len() {
        if let Some(id) = outcomes.value(row, outcome_id_idx) {
            outcome_by_id
                .entry(id)
                .or_insert_with(|| outcomes.value(row, outcome_type_idx).unwrap_or_default());
        }
    }

    let joined: Vec<String> = (0..primary.len())
        .map(|row| {
            primary
                .value(row, id_idx)
                .and_then(|id| outcome_by_id.get(id))
                .map(|outcome| outcome.to_string())
                .unwrap_or_default()
        })
        .collect();

    let mut merged = primary.clone();
    merged.set_column(OUTCOME_TYPE, joined);
    Ok(merged)
}

/// Remove the reporting-source, context and raw location columns.
pub fn drop_unused_columns(table: &mut Table) -> Result<()> {
    table.drop_columns(&STAGING_DROPPED_COLUMNS)
}

/// Staging layer: merge outcomes, trim columns and write the staged file.
pub fn stage_data(primary: &Table, outcomes: &Table, output_file: &Path) -> Result<StageOutput> {
    info!("Starting data staging");

    let result = merge_outcomes(primary, outcomes).and_then(|mut staged| {
        drop_unused_columns(&mut staged)?;
        write_output(&staged, output_file)
    });

    match result {
        Ok(output) => {
            info!("Data staging completed successfully");
            Ok(output)
        }
        Err(e) => {
            error!("Error during data staging: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn street() -> Table {
        Table::from_rows(
            &["Crime ID", "Month", "Reported by", "Location", "Context", "Crime type", "Last outcome category"],
            &[
                &["c1", "2022-01", "Cheshire Constabulary", "On or near Park Road", "", "Burglary", "Under investigation"],
                &["", "2022-01", "Cheshire Constabulary", "On or near High Street", "", "Anti-social behaviour", ""],
                &["c3", "2022-01", "Cheshire Constabulary", "On or near Mill Lane", "", "Vehicle crime", "Unable to prosecute suspect"],
            ],
        )
    }

    fn outcomes() -> Table {
        Table::from_rows(
            &["Crime ID", "Month", "Outcome type"],
            &[
                &["c1", "2022-01", "Local resolution"],
                &["c9", "2022-01", "Offender given a caution"],
                &["c1", "2022-02", "Awaiting court outcome"],
            ],
        )
    }

    #[test]
    fn test_left_join_keeps_every_primary_row() {
        let merged = merge_outcomes(&street(), &outcomes()).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.headers.last().map(String::as_str), Some("Outcome type"));

        let outcome = merged.column_values("Outcome type").unwrap();
        // first matching outcome wins, unmatched and null IDs stay null
        assert_eq!(outcome, vec![Some("Local resolution"), None, None]);
    }

    #[test]
    fn test_only_outcome_type_is_brought_in() {
        let merged = merge_outcomes(&street(), &outcomes()).unwrap();
        assert_eq!(merged.headers.len(), street().headers.len() + 1);
        assert_eq!(merged.headers.iter().filter(|h| *h == "Month").count(), 1);
    }

    #[test]
    fn test_null_outcome_type_stays_null() {
        let outcomes = Table::from_rows(&["Crime ID", "Outcome type"], &[&["c1", ""]]);
        let merged = merge_outcomes(&street(), &outcomes).unwrap();
        assert_eq!(merged.value(0, merged.require_column("Outcome type").unwrap()), None);
    }

    #[test]
    fn test_missing_join_columns_fail() {
        let no_type = Table::from_rows(&["Crime ID"], &[&["c1"]]);
        assert!(matches!(
            merge_outcomes(&street(), &no_type),
            Err(PipelineError::MissingColumn(ref c)) if c == "Outcome type"
        ));

        let no_id = Table::from_rows(&["Crime type"], &[&["Burglary"]]);
        assert!(matches!(
            merge_outcomes(&no_id, &outcomes()),
            Err(PipelineError::MissingColumn(ref c)) if c == "Crime ID"
        ));
    }

    #[test]
    fn test_existing_outcome_type_column_is_rejected() {
        let primary = Table::from_rows(&["Crime ID", "Outcome type"], &[&["c1", "x"]]);
        assert!(matches!(
            merge_outcomes(&primary, &outcomes()),
            Err(PipelineError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_stage_data_writes_trimmed_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staged.csv");

        let output = stage_data(&street(), &outcomes(), &path).unwrap();
        assert_eq!(output.rows, 3);

        let staged = Table::read_csv(&path).unwrap();
        assert_eq!(
            staged.headers,
            vec!["Crime ID", "Month", "Crime type", "Last outcome category", "Outcome type"]
        );
        assert_eq!(staged.rows[0], vec!["c1", "2022-01", "Burglary", "Under investigation", "Local resolution"]);
    }

    #[test]
    fn test_stage_data_requires_dropped_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staged.csv");
        let primary = Table::from_rows(&["Crime ID", "Crime type"], &[&["c1", "Burglary"]]);

        let err = stage_data(&primary, &outcomes(), &path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(_)));
        assert!(!path.exists());
    }
}
