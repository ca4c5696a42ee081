// ============================================================
// CELL VALUE
// ============================================================
// A single value in a sales table, before or after coercion

use chrono::NaiveDate;
use serde::Serialize;

/// Tokens that spreadsheet and CSV exports use for a missing value.
const NA_TOKENS: [&str; 12] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// A table cell.
///
/// CSV input produces `Text` and `Null` only; spreadsheet input may also
/// produce `Number`, `Date` and `Bool`. The cleaner turns the required
/// columns into `Number`/`Date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    /// Build a cell from raw text, mapping NA tokens to `Null`.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NA_TOKENS.contains(&trimmed) {
            Cell::Null
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell. Text is parsed strictly.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Grouping key; `None` for nulls.
    pub fn label(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Number(n) => Some(format!("{}", n)),
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Text(s) => Some(s.clone()),
        }
    }
}
