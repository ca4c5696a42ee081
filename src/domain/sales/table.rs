// ============================================================
// SALES TABLE
// ============================================================
// Ordered columns plus ordered rows of cells

use serde::Serialize;

use super::Cell;
use crate::domain::error::{AppError, Result};

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-side file name, used as the format hint
    pub filename: String,

    /// Raw file content
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// In-memory sales record table.
///
/// Every row has exactly one cell per column; constructors pad short rows
/// with `Null`. Loaders reject rows wider than the header before this point.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SalesTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl SalesTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor used by tests and fixtures.
    pub fn from_text(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|raw| Cell::from_raw(raw)).collect())
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of `name`, or a `SchemaError` naming it.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| AppError::missing_column(name))
    }

    /// Cells of one column in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell> + '_> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// New table holding the rows at `indices`, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// New table keeping the rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Append a column; `cells` must have one entry per row.
    pub fn with_column(mut self, name: &str, cells: Vec<Cell>) -> Result<Self> {
        if cells.len() != self.rows.len() {
            return Err(AppError::Internal(format!(
                "column '{}' has {} cells for {} rows",
                name,
                cells.len(),
                self.rows.len()
            )));
        }
        self.columns.push(name.to_string());
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
        Ok(self)
    }

    /// Number of consecutive parts of at most `rows_per_part` rows.
    pub fn part_count(&self, rows_per_part: usize) -> Result<usize> {
        check_part_size(rows_per_part)?;
        Ok(self.rows.len().div_ceil(rows_per_part))
    }

    /// Part `index` (zero-based) of the split into `rows_per_part`-row parts.
    /// Only the rows of that part are copied.
    pub fn part(&self, index: usize, rows_per_part: usize) -> Result<Option<Self>> {
        check_part_size(rows_per_part)?;
        Ok(self.rows.chunks(rows_per_part).nth(index).map(|rows| Self {
            columns: self.columns.clone(),
            rows: rows.to_vec(),
        }))
    }
}

fn check_part_size(rows_per_part: usize) -> Result<()> {
    if rows_per_part == 0 {
        return Err(AppError::ValidationError(
            "rows per part must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_padded_and_truncated() {
        let table = SalesTable::new(
            vec!["a".to_string(), "b".to_string()],
            vec![
                vec![Cell::from_raw("1")],
                vec![Cell::from_raw("1"), Cell::from_raw("2"), Cell::from_raw("3")],
            ],
        );
        assert_eq!(table.rows()[0], vec![Cell::from_raw("1"), Cell::Null]);
        assert_eq!(table.rows()[1].len(), 2);
    }

    #[test]
    fn test_require_column_reports_schema_error() {
        let table = SalesTable::from_text(&["Date"], &[&["04-30-22"]]);
        let err = table.require_column("Amount").unwrap_err();
        assert!(matches!(err, AppError::SchemaError(_)));
    }

    #[test]
    fn test_parts_preserve_order() {
        let table = SalesTable::from_text(&["n"], &[&["1"], &["2"], &["3"], &["4"], &["5"]]);
        assert_eq!(table.part_count(2).unwrap(), 3);

        let middle = table.part(1, 2).unwrap().unwrap();
        assert_eq!(middle.len(), 2);
        assert_eq!(middle.cell(0, "n"), Some(&Cell::from_raw("3")));
        assert_eq!(table.part(2, 2).unwrap().map(|p| p.len()), Some(1));
        assert!(table.part(3, 2).unwrap().is_none());

        assert!(table.part_count(0).is_err());
        assert!(table.part(0, 0).is_err());
        assert_eq!(SalesTable::default().part_count(10).unwrap(), 0);
    }

    #[test]
    fn test_upload_extension() {
        assert_eq!(Upload::new("Report.XLSX", vec![]).extension().as_deref(), Some("xlsx"));
        assert_eq!(Upload::new("report", vec![]).extension(), None);
    }
}
