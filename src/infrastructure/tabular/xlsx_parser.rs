// ============================================================
// SPREADSHEET PARSER
// ============================================================
// Read the first worksheet of an xlsx/xls upload into a table

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use tracing::debug;

use super::normalize_headers;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::{Cell, SalesTable};

/// Spreadsheet parser; the first row of the first sheet is the header.
#[derive(Debug, Default)]
pub struct XlsxParser;

impl XlsxParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw workbook bytes (xlsx, xlsm or xls)
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<SalesTable> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::FormatError("No worksheet found in workbook".to_string()))??;

        self.parse_range(&range)
    }

    fn parse_range(&self, range: &Range<Data>) -> Result<SalesTable> {
        let mut rows_iter = range.rows();

        let header = rows_iter
            .next()
            .ok_or_else(|| AppError::FormatError("Worksheet is empty".to_string()))?;

        let raw_headers: Vec<String> = header
            .iter()
            .map(|cell| convert_cell(cell).label().unwrap_or_default())
            .collect();

        if raw_headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::FormatError(
                "Worksheet has no header row".to_string(),
            ));
        }

        let columns = normalize_headers(&raw_headers);
        let rows: Vec<Vec<Cell>> = rows_iter
            .map(|row| row.iter().map(convert_cell).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_null()))
            .collect();

        debug!(
            columns = columns.len(),
            rows = rows.len(),
            "Parsed spreadsheet upload"
        );

        Ok(SalesTable::new(columns, rows))
    }
}

/// Spreadsheet cells keep their native type; text goes through the same
/// NA-token handling as CSV.
fn convert_cell(cell: &Data) -> Cell {
    if cell.is_empty() || matches!(cell, Data::Error(_)) {
        Cell::Null
    } else if cell.is_datetime() {
        cell.as_date().map(Cell::Date).unwrap_or(Cell::Null)
    } else if let Some(text) = cell.get_string() {
        Cell::from_raw(text)
    } else if let Some(value) = cell.get_float() {
        Cell::Number(value)
    } else if let Some(value) = cell.get_int() {
        Cell::Number(value as f64)
    } else if let Some(value) = cell.get_bool() {
        Cell::Bool(value)
    } else {
        Cell::from_raw(&cell.to_string())
    }
}
