//! In-memory tabular data read from and written to CSV files.
//!
//! Cells are kept as the text found in the file. An empty cell is treated as
//! null by every transform.

use csv::{ReaderBuilder, Terminator, WriterBuilder};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// column names, from the header row
    pub headers: Vec<String>,
    /// one entry per data row, always `headers.len()` cells wide
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Build a table from string literals. Short rows are padded with nulls.
    pub fn from_rows(headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            let mut cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            cells.resize(table.headers.len(), String::new());
            table.rows.push(cells);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a column that the caller cannot proceed without.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Cell value, with empty cells reported as `None`.
    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.require_column(name)?;
        Ok((0..self.rows.len()).map(|row| self.value(row, idx)).collect())
    }

    /// Replace the named column, or append it when absent.
    /// `values` must hold one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (cells, value) in self.rows.iter_mut().zip(values) {
                    cells.push(value);
                }
            }
        }
    }

    /// Remove columns by name. Every name must be present.
    pub fn drop_columns(&mut self, names: &[&str]) -> Result<()> {
        let mut indices = names
            .iter()
            .map(|name| self.require_column(name))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();
        indices.dedup();

        for idx in indices.into_iter().rev() {
            self.headers.remove(idx);
            for cells in &mut self.rows {
                cells.remove(idx);
            }
        }
        Ok(())
    }

    /// Parse CSV text with a header row.
    ///
    /// Rows shorter than the header are padded with nulls; a row with more
    /// fields than the header is rejected.
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, String> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err("No columns to parse from file".to_string());
        }

        let mut table = Self::new(headers);
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| e.to_string())?;
            if record.len() > table.headers.len() {
                return Err(format!(
                    "Expected {} fields in data row {}, saw {}",
                    table.headers.len(),
                    line + 1,
                    record.len()
                ));
            }
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.resize(table.headers.len(), String::new());
            table.rows.push(cells);
        }
        Ok(table)
    }

    /// Serialize as comma-delimited text with a header row and `\n` line endings.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        wtr.write_record(&self.headers)?;
        for cells in &self.rows {
            wtr.write_record(cells)?;
        }
        wtr.into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))
    }

    /// Write the table to `path`, returning the SHA-256 hex digest of the bytes written.
    pub fn write_csv(&self, path: &Path) -> Result<String> {
        let bytes = self.to_csv_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Read a CSV file. Open and parse problems are reported as `PipelineError::Parse`.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let parse_error = |message: String| PipelineError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let file = File::open(path).map_err(|e| parse_error(e.to_string()))?;
        Self::from_reader(file).map_err(parse_error)
    }
}
