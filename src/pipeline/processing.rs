use std::path::Path;
use tracing::{debug, error, info};

use super::{write_output, StageOutput};
use crate::categories::CategoryMap;
use crate::constants::{BROAD_OUTCOME_CATEGORY, FINAL_OUTCOME, LAST_OUTCOME_CATEGORY, OUTCOME_TYPE};
use crate::error::Result;
use crate::table::Table;

/// Set `Final Outcome`: the joined `Outcome type` when present, otherwise
/// the row's `Last outcome category`.
pub fn resolve_final_outcome(table: &mut Table) -> Result<()> {
    let outcome_type = table.require_column(OUTCOME_TYPE)?;
    let last_category = table.require_column(LAST_OUTCOME_CATEGORY)?;

    let resolved: Vec<String> = (0..table.len())
        .map(|row| {
            table
                .value(row, outcome_type)
                .or_else(|| table.value(row, last_category))
                .unwrap_or_default()
                .to_string()
        })
        .collect();

    table.set_column(FINAL_OUTCOME, resolved);
    Ok(())
}

/// Set `Broad Outcome Category` from each row's `Final Outcome`.
pub fn apply_categorization(table: &mut Table, categories: &CategoryMap) -> Result<()> {
    let final_outcome = table.require_column(FINAL_OUTCOME)?;

    let broad: Vec<String> = (0..table.len())
        .map(|row| categories.categorize(table.value(row, final_outcome)).to_string())
        .collect();

    table.set_column(BROAD_OUTCOME_CATEGORY, broad);
    Ok(())
}

/// Processing layer: derive the resolved outcome and its category, then write the processed file.
pub fn process_data(mut staged: Table, output_file: &Path, categories: &CategoryMap) -> Result<StageOutput> {
    info!("Starting Data Processing");
    debug!("Categorizing against {} known outcome values", categories.len());

    let result = resolve_final_outcome(&mut staged)
        .and_then(|_| apply_categorization(&mut staged, categories))
        .and_then(|_| write_output(&staged, output_file));

    match result {
        Ok(output) => {
            info!("Data Processing completed successfully");
            Ok(output)
        }
        Err(e) => {
            error!("Error during data processing: {}", e);
            Err(e)
        }
    }
}
