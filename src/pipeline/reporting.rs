use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

use super::{write_output, StageOutput};
use crate::constants::{BROAD_OUTCOME_CATEGORY, COUNT, CRIME_TYPE};
use crate::error::Result;
use crate::table::Table;

/// Count processed rows per (`Crime type`, `Broad Outcome Category`).
///
/// One output row per distinct pair, ordered by the pair. A null crime type
/// is its own group, so the counts always add up to the input row count.
pub fn aggregate(processed: &Table) -> Result<Table> {
    let crime_type = processed.require_column(CRIME_TYPE)?;
    let category = processed.require_column(BROAD_OUTCOME_CATEGORY)?;

    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for row in 0..processed.len() {
        let key = (
            processed.value(row, crime_type).unwrap_or_default(),
            processed.value(row, category).unwrap_or_default(),
        );
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut report = Table::new(vec![
        CRIME_TYPE.to_string(),
        BROAD_OUTCOME_CATEGORY.to_string(),
        COUNT.to_string(),
    ]);
    report.rows = counts
        .into_iter()
        .map(|((crime, broad), count)| vec![crime.to_string(), broad.to_string(), count.to_string()])
        .collect();
    Ok(report)
}

/// Reporting layer: aggregate the processed table and write the report file.
pub fn report_data(processed: &Table, output_file: &Path) -> Result<StageOutput> {
    info!("Starting reporting data aggregation");

    let result = aggregate(processed).and_then(|report| write_output(&report, output_file));

    match result {
        Ok(output) => {
            info!("Reporting data aggregation completed successfully");
            Ok(output)
        }
        Err(e) => {
            error!("Error during reporting data aggregation: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn processed() -> Table {
        Table::from_rows(
            &["Crime ID", "Crime type", "Final Outcome", "Broad Outcome Category"],
            &[
                &["c1", "Vehicle crime", "Local resolution", "Non-criminal Outcome"],
                &["c2", "Burglary", "Unable to prosecute suspect", "No Further Action"],
                &["c3", "Burglary", "Status update unavailable", "No Further Action"],
                &["", "Anti-social behaviour", "", "Unknown"],
                &["c5", "Burglary", "Local resolution", "Non-criminal Outcome"],
                &["c6", "", "", "Unknown"],
            ],
        )
    }

    #[test]
    fn test_one_row_per_distinct_pair_sorted() {
        let report = aggregate(&processed()).unwrap();
        assert_eq!(report.headers, vec!["Crime type", "Broad Outcome Category", "Count"]);
        assert_eq!(
            report.rows,
            vec![
                vec!["", "Unknown", "1"],
                vec!["Anti-social behaviour", "Unknown", "1"],
                vec!["Burglary", "No Further Action", "2"],
                vec!["Burglary", "Non-criminal Outcome", "1"],
                vec!["Vehicle crime", "Non-criminal Outcome", "1"],
            ]
        );
    }

    #[test]
    fn test_counts_sum_to_row_count() {
        let table = processed();
        let report = aggregate(&table).unwrap();
        let total: usize = report
            .rows
            .iter()
            .map(|row| row[2].parse::<usize>().unwrap())
            .sum();
        assert_eq!(total, table.len());
    }

    #[test]
    fn test_empty_input_gives_header_only_report() {
        let table = Table::from_rows(&["Crime type", "Broad Outcome Category"], &[]);
        let report = aggregate(&table).unwrap();
        assert!(report.is_empty());
        assert_eq!(
            String::from_utf8(report.to_csv_bytes().unwrap()).unwrap(),
            "Crime type,Broad Outcome Category,Count\n"
        );
    }

    #[test]
    fn test_missing_category_column_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporting.csv");
        let table = Table::from_rows(&["Crime type"], &[&["Burglary"]]);

        let err = report_data(&table, &path).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "Broad Outcome Category"));
        assert!(!path.exists());
    }
}
