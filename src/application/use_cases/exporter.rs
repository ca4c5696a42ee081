//! Exporter Use Case
//!
//! CSV downloads of a table, whole or split into fixed-size parts.

use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::SalesTable;
use crate::infrastructure::tabular::CsvWriter;

/// Rows per part when the client does not choose.
pub const DEFAULT_PART_ROWS: usize = 25_000;

#[derive(Default)]
pub struct Exporter {
    writer: CsvWriter,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn export_csv(&self, table: &SalesTable) -> Result<Vec<u8>> {
        self.writer.write(table)
    }

    /// Number of parts `table` splits into.
    pub fn part_count(&self, table: &SalesTable, rows_per_part: usize) -> Result<usize> {
        table.part_count(rows_per_part)
    }

    /// CSV of part `index` (zero-based).
    pub fn export_part(
        &self,
        table: &SalesTable,
        index: usize,
        rows_per_part: usize,
    ) -> Result<Vec<u8>> {
        match table.part(index, rows_per_part)? {
            Some(part) => {
                debug!(index, rows = part.len(), rows_per_part, "Exporting table part");
                self.export_csv(&part)
            }
            None => Err(AppError::NotFound(format!(
                "part {} does not exist ({} parts)",
                index,
                table.part_count(rows_per_part)?
            ))),
        }
    }
}
