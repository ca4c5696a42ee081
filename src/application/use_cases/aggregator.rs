//! Aggregator Use Case
//!
//! KPI and chart series over a cleaned sales table. Every function is
//! pure: the same table always yields the same output, in the same order.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::domain::error::Result;
use crate::domain::sales::columns::{AMOUNT, CATEGORY, DATE, SHIP_STATE, STATUS};
use crate::domain::sales::{
    CountBucket, Dashboard, DashboardFilter, KpiSnapshot, SalesTable, TimePoint,
};

pub fn total_rows(table: &SalesTable) -> usize {
    table.len()
}

/// Number of distinct non-null values in `column`.
pub fn distinct_count(table: &SalesTable, column: &str) -> Result<usize> {
    let distinct: HashSet<String> = table.column(column)?.filter_map(|c| c.label()).collect();
    Ok(distinct.len())
}

pub fn kpi_snapshot(table: &SalesTable) -> Result<KpiSnapshot> {
    Ok(KpiSnapshot {
        total_rows: total_rows(table),
        num_products: distinct_count(table, CATEGORY)?,
        num_states: distinct_count(table, SHIP_STATE)?,
    })
}

/// Sum of `Amount` per `Date`, ascending by date. Rows without a parsed
/// date or a numeric amount do not contribute.
pub fn time_series(table: &SalesTable) -> Result<Vec<TimePoint>> {
    let date_idx = table.require_column(DATE)?;
    let amount_idx = table.require_column(AMOUNT)?;

    let mut totals = BTreeMap::new();
    for row in table.rows() {
        if let (Some(date), Some(amount)) = (row[date_idx].as_date(), row[amount_idx].as_number()) {
            *totals.entry(date).or_insert(0.0) += amount;
        }
    }

    Ok(totals
        .into_iter()
        .map(|(date, amount)| TimePoint { date, amount })
        .collect())
}

/// Row count per non-null label, in first-appearance order.
pub fn value_counts(table: &SalesTable, column: &str) -> Result<Vec<CountBucket>> {
    let mut buckets: Vec<CountBucket> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for label in table.column(column)?.filter_map(|c| c.label()) {
        match position.get(&label) {
            Some(&idx) => buckets[idx].count += 1,
            None => {
                position.insert(label.clone(), buckets.len());
                buckets.push(CountBucket::new(label, 1));
            }
        }
    }
    Ok(buckets)
}

/// Counts sorted by descending count; ties keep first-appearance order.
fn ranked_counts(table: &SalesTable, column: &str) -> Result<Vec<CountBucket>> {
    let mut buckets = value_counts(table, column)?;
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(buckets)
}

pub fn category_distribution(table: &SalesTable) -> Result<Vec<CountBucket>> {
    ranked_counts(table, CATEGORY)
}

pub fn state_distribution(table: &SalesTable) -> Result<Vec<CountBucket>> {
    ranked_counts(table, SHIP_STATE)
}

pub fn status_distribution(table: &SalesTable) -> Result<Vec<CountBucket>> {
    value_counts(table, STATUS)
}

/// Rows of `table` that pass `filter`. Fails when a filter needs a column
/// the table does not have.
pub fn apply_filter(table: &SalesTable, filter: &DashboardFilter) -> Result<SalesTable> {
    if filter.is_empty() {
        return Ok(table.clone());
    }

    let date_idx = match (filter.start, filter.end) {
        (None, None) => None,
        _ => Some(table.require_column(DATE)?),
    };
    let state_idx = if filter.states.is_empty() {
        None
    } else {
        Some(table.require_column(SHIP_STATE)?)
    };

    let filtered = table.filter_rows(|row| {
        if let Some(idx) = date_idx {
            let Some(date) = row[idx].as_date() else {
                return false;
            };
            if filter.start.is_some_and(|start| date < start)
                || filter.end.is_some_and(|end| date > end)
            {
                return false;
            }
        }
        if let Some(idx) = state_idx {
            match row[idx].label() {
                Some(state) if filter.states.contains(&state) => {}
                _ => return false,
            }
        }
        true
    });

    debug!(
        before = table.len(),
        after = filtered.len(),
        "Applied dashboard filter"
    );
    Ok(filtered)
}

impl Dashboard {
    /// Compute every section independently over the filtered table.
    pub fn build(table: &SalesTable, filter: DashboardFilter) -> Result<Self> {
        let view = apply_filter(table, &filter)?;
        Ok(Self {
            kpis: kpi_snapshot(&view).into(),
            time_series: time_series(&view).into(),
            categories: category_distribution(&view).into(),
            states: state_distribution(&view).into(),
            statuses: status_distribution(&view).into(),
            filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::sales::{Cell, Section};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 4, d).unwrap()
    }

    fn sample_table() -> SalesTable {
        let row = |d: u32, status: &str, category: &str, amount: f64, state: &str| {
            vec![
                Cell::Date(day(d)),
                Cell::from_raw(status),
                Cell::from_raw(category),
                Cell::Number(amount),
                Cell::Number(1.0),
                Cell::from_raw(state),
            ]
        };
        SalesTable::new(
            ["Date", "Status", "Category", "Amount", "Qty", "ship-state"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            vec![
                row(30, "Shipped", "Set", 100.0, "KERALA"),
                row(29, "Cancelled", "Kurta", 50.0, "GOA"),
                row(30, "Shipped", "Kurta", 25.5, "GOA"),
                row(28, "Pending", "Top", 10.0, ""),
                row(29, "Shipped", "Kurta", 4.5, "KERALA"),
            ],
        )
    }

    #[test]
    fn test_value_counts_first_appearance() {
        let table = SalesTable::from_text(&["Category"], &[&["A"], &["A"], &["B"]]);
        assert_eq!(
            category_distribution(&table).unwrap(),
            vec![CountBucket::new("A", 2), CountBucket::new("B", 1)]
        );
    }

    #[test]
    fn test_ranked_ties_keep_first_appearance() {
        let table = SalesTable::from_text(
            &["ship-state"],
            &[&["GOA"], &["KERALA"], &["KERALA"], &["GOA"], &["PUNJAB"]],
        );
        let labels: Vec<String> = state_distribution(&table)
            .unwrap()
            .into_iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(labels, vec!["GOA", "KERALA", "PUNJAB"]);
    }

    #[test]
    fn test_kpis_and_series() {
        let table = sample_table();

        let kpis = kpi_snapshot(&table).unwrap();
        assert_eq!(
            kpis,
            KpiSnapshot {
                total_rows: 5,
                num_products: 3,
                num_states: 2,
            }
        );

        let series = time_series(&table).unwrap();
        assert_eq!(
            series,
            vec![
                TimePoint { date: day(28), amount: 10.0 },
                TimePoint { date: day(29), amount: 54.5 },
                TimePoint { date: day(30), amount: 125.5 },
            ]
        );

        let statuses: Vec<(String, usize)> = status_distribution(&table)
            .unwrap()
            .into_iter()
            .map(|b| (b.label, b.count))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("Shipped".to_string(), 3),
                ("Cancelled".to_string(), 1),
                ("Pending".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_dashboard_is_deterministic() {
        let table = sample_table();
        let first = Dashboard::build(&table, DashboardFilter::default()).unwrap();
        let second = Dashboard::build(&table, DashboardFilter::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_column_only_fails_its_section() {
        let table = SalesTable::from_text(
            &["Date", "Category", "Amount", "Qty", "Status"],
            &[&["04-30-22", "Set", "1", "1", "Shipped"]],
        );

        let dashboard = Dashboard::build(&table, DashboardFilter::default()).unwrap();

        assert!(matches!(
            &dashboard.states,
            Section::Unavailable { error, .. } if error == "schema_error"
        ));
        assert!(!dashboard.kpis.is_ready());
        assert!(dashboard.categories.is_ready());
        assert!(dashboard.statuses.is_ready());
        assert!(dashboard.time_series.is_ready());
    }

    #[test]
    fn test_filter_by_dates_and_states() {
        let table = sample_table();
        let filter = DashboardFilter {
            start: Some(day(29)),
            end: Some(day(30)),
            states: vec!["GOA".to_string()],
        };

        let dashboard = Dashboard::build(&table, filter).unwrap();

        assert_eq!(dashboard.kpis.ready().map(|k| k.total_rows), Some(2));
        assert_eq!(
            dashboard.time_series.ready().cloned(),
            Some(vec![
                TimePoint { date: day(29), amount: 50.0 },
                TimePoint { date: day(30), amount: 25.5 },
            ])
        );
    }

    #[test]
    fn test_state_filter_without_column_fails() {
        let table = SalesTable::from_text(&["Date", "Amount", "Qty"], &[&["x", "1", "1"]]);
        let filter = DashboardFilter {
            states: vec!["GOA".to_string()],
            ..Default::default()
        };
        let err = Dashboard::build(&table, filter).unwrap_err();
        assert!(matches!(err, AppError::SchemaError(_)));
    }
}
