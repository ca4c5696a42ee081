// ============================================================
// CLEANER USE CASE
// ============================================================
// Normalize columns, coerce types and enforce completeness of the
// required fields. Steps run in a fixed order; each one assumes the
// shape produced by the previous step.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::error::{AppError, Result};
use crate::domain::sales::columns::{self, AMOUNT, DATE, QTY};
use crate::domain::sales::{
    Cell, CleaningConfig, FillPolicy, ResidualNullPolicy, SalesTable,
};

/// Spreadsheet exports name empty header cells `Unnamed: <n>`.
static PLACEHOLDER_COLUMN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Unnamed").unwrap());

static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}[-/]").unwrap());

const YEAR_FIRST_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

const DATE_FORMATS: [&str; 7] = [
    "%m-%d-%y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// What each cleaning step did to one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningStats {
    pub input_rows: usize,
    pub dropped_columns: Vec<String>,
    /// Rows removed because a required field was absent
    pub dropped_missing: usize,
    /// Date cells that did not parse and became null
    pub unparseable_dates: usize,
    /// Null cells replaced by forward-fill
    pub filled_cells: usize,
    /// Amount/Qty cells that did not parse and became null
    pub unparseable_numbers: usize,
    /// Rows removed after coercion left a required field null
    pub dropped_residual: usize,
    pub output_rows: usize,
}

/// Turns a raw table into one where every row has a numeric `Amount` and
/// `Qty` and a calendar `Date`.
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    config: CleaningConfig,
}

impl Cleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    /// Clean `table` into a new table; the input is left untouched.
    pub fn clean(&self, table: &SalesTable) -> Result<SalesTable> {
        self.clean_with_stats(table).map(|(table, _)| table)
    }

    pub fn clean_with_stats(&self, table: &SalesTable) -> Result<(SalesTable, CleaningStats)> {
        let missing: Vec<&str> = columns::REQUIRED
            .iter()
            .copied()
            .filter(|name| table.column_index(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::SchemaError(format!(
                "required column(s) missing: {}",
                missing.join(", ")
            )));
        }

        let mut stats = CleaningStats {
            input_rows: table.len(),
            ..Default::default()
        };

        // 1. Drop placeholder columns
        let (column_names, mut rows) = drop_placeholder_columns(table, &mut stats);
        let index_of = |name: &str| {
            column_names
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| AppError::missing_column(name))
        };
        let amount = index_of(AMOUNT)?;
        let date = index_of(DATE)?;
        let qty = index_of(QTY)?;
        let required = [amount, date, qty];

        // 2. Drop rows where a required field is structurally absent
        let before = rows.len();
        rows.retain(|row| required.iter().all(|&idx| !row[idx].is_null()));
        stats.dropped_missing = before - rows.len();

        // 3. Parse dates; failures become null and stay for now
        for row in rows.iter_mut() {
            let parsed = parse_date_cell(&row[date]);
            if parsed.is_null() {
                stats.unparseable_dates += 1;
            }
            row[date] = parsed;
        }

        // 4. Forward-fill
        for idx in 0..column_names.len() {
            let skip = self.config.fill_policy == FillPolicy::RequiredFieldsExcluded
                && required.contains(&idx);
            if !skip {
                stats.filled_cells += forward_fill(&mut rows, idx);
            }
        }

        // 5. Coerce numeric fields
        for row in rows.iter_mut() {
            for idx in [amount, qty] {
                let coerced = row[idx].as_number().map(Cell::Number).unwrap_or(Cell::Null);
                if coerced.is_null() && !row[idx].is_null() {
                    stats.unparseable_numbers += 1;
                }
                row[idx] = coerced;
            }
        }

        // 6. Restore the completeness invariant
        if self.config.residual_nulls == ResidualNullPolicy::Drop {
            let before = rows.len();
            rows.retain(|row| required.iter().all(|&idx| !row[idx].is_null()));
            stats.dropped_residual = before - rows.len();
        }

        stats.output_rows = rows.len();
        info!(
            input_rows = stats.input_rows,
            output_rows = stats.output_rows,
            dropped_missing = stats.dropped_missing,
            dropped_residual = stats.dropped_residual,
            filled_cells = stats.filled_cells,
            fill_policy = ?self.config.fill_policy,
            "Cleaned sales table"
        );

        Ok((SalesTable::new(column_names, rows), stats))
    }
}

fn drop_placeholder_columns(
    table: &SalesTable,
    stats: &mut CleaningStats,
) -> (Vec<String>, Vec<Vec<Cell>>) {
    let keep: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, name)| !PLACEHOLDER_COLUMN.is_match(name))
        .map(|(idx, _)| idx)
        .collect();

    stats.dropped_columns = table
        .columns()
        .iter()
        .filter(|name| PLACEHOLDER_COLUMN.is_match(name))
        .cloned()
        .collect();
    if !stats.dropped_columns.is_empty() {
        debug!(columns = ?stats.dropped_columns, "Dropping placeholder columns");
    }

    let names = keep.iter().map(|&idx| table.columns()[idx].clone()).collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| keep.iter().map(|&idx| row[idx].clone()).collect())
        .collect();
    (names, rows)
}

/// Replace nulls in column `idx` with the nearest preceding non-null value.
/// Returns how many cells were filled.
fn forward_fill(rows: &mut [Vec<Cell>], idx: usize) -> usize {
    let mut last: Option<Cell> = None;
    let mut filled = 0;
    for row in rows.iter_mut() {
        if row[idx].is_null() {
            if let Some(value) = &last {
                row[idx] = value.clone();
                filled += 1;
            }
        } else {
            last = Some(row[idx].clone());
        }
    }
    filled
}

fn parse_date_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Date(date) => Cell::Date(*date),
        Cell::Text(text) => parse_date(text).map(Cell::Date).unwrap_or(Cell::Null),
        _ => Cell::Null,
    }
}

/// Parse a calendar date, month-first when the order is ambiguous.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    let formats: &[&str] = if YEAR_FIRST.is_match(text) {
        &YEAR_FIRST_FORMATS
    } else {
        &DATE_FORMATS
    };
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|datetime| datetime.date())
        })
}
