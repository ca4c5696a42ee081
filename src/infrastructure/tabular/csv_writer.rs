// ============================================================
// CSV WRITER
// ============================================================
// Serialize a table back to CSV for downloads

use csv::WriterBuilder;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::{Cell, SalesTable};

/// CSV writer for exported tables
pub struct CsvWriter {
    delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `table` with a header row. Nulls are empty fields, dates are
    /// `YYYY-MM-DD`.
    pub fn write(&self, table: &SalesTable) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer
            .write_record(table.columns())
            .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;

        for (index, row) in table.rows().iter().enumerate() {
            writer
                .write_record(row.iter().map(render_cell))
                .map_err(|e| {
                    AppError::Internal(format!("Failed to write CSV row {}: {}", index + 1, e))
                })?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush CSV: {}", e)))
    }
}

fn render_cell(cell: &Cell) -> String {
    cell.label().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_write_table() {
        let table = SalesTable::new(
            vec!["Date".to_string(), "Amount".to_string(), "ship-city".to_string()],
            vec![
                vec![
                    Cell::Date(NaiveDate::from_ymd_opt(2022, 4, 30).unwrap()),
                    Cell::Number(647.62),
                    Cell::Text("MUMBAI, MH".to_string()),
                ],
                vec![Cell::Null, Cell::Number(406.0), Cell::Null],
            ],
        );

        let bytes = CsvWriter::new().write(&table).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "Date,Amount,ship-city\n2022-04-30,647.62,\"MUMBAI, MH\"\n,406,\n"
        );
    }
}
