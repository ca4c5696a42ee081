//! Anomaly Detector Use Case
//!
//! Flags rows whose `Amount` is unusually easy to isolate:
//! - Fits an isolation forest on every numeric `Amount`
//! - Scores each row and derives the decision offset from `contamination`
//! - Returns the flagged rows plus a Date/Amount overlay for charting

mod isolation_forest;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info};

use crate::domain::error::{AppError, Result};
use crate::domain::sales::columns::{AMOUNT, ANOMALY, DATE};
use crate::domain::sales::{
    AnomalyConfig, AnomalyReport, Cell, ScatterPoint, SalesTable, SeedPolicy,
};

pub use isolation_forest::IsolationForest;
use isolation_forest::percentile;

/// Anomaly detector over the `Amount` column
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// Create a new detector; the configuration is checked up front
    pub fn new(config: AnomalyConfig) -> Result<Self> {
        config.validate().map_err(AppError::ValidationError)?;
        Ok(Self { config })
    }

    /// Fit, score and flag `table`. The input is not modified.
    pub fn detect(&self, table: &SalesTable) -> Result<AnomalyReport> {
        if table.is_empty() {
            return Err(AppError::InsufficientData("the table has no rows".to_string()));
        }
        let amount_idx = table.require_column(AMOUNT)?;
        let date_idx = table.column_index(DATE);

        let amounts: Vec<Option<f64>> = table
            .rows()
            .iter()
            .map(|row| row[amount_idx].as_number())
            .collect();
        let numeric: Vec<f64> = amounts.iter().flatten().copied().collect();

        let (min, max) = numeric
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if numeric.len() < 2 || min >= max {
            return Err(AppError::InsufficientData(format!(
                "'{}' needs at least 2 distinct numeric values",
                AMOUNT
            )));
        }

        let mut rng = match self.config.seed {
            SeedPolicy::Fixed(seed) => ChaCha20Rng::seed_from_u64(seed),
            SeedPolicy::Entropy => ChaCha20Rng::from_entropy(),
        };
        let forest = IsolationForest::fit(
            &numeric,
            self.config.n_estimators,
            self.config.max_samples,
            &mut rng,
        );

        let scores: Vec<Option<f64>> = amounts
            .iter()
            .map(|amount| amount.map(|value| forest.score(value)))
            .collect();

        let mut negated: Vec<f64> = scores.iter().flatten().map(|s| -s).collect();
        negated.sort_by(|a, b| a.total_cmp(b));
        let offset = percentile(&negated, 100.0 * self.config.contamination);
        debug!(offset, scored = negated.len(), "Isolation forest fitted");

        let mut flagged = Vec::new();
        let mut overlay = Vec::with_capacity(numeric.len());
        for (row, (amount, score)) in amounts.iter().zip(&scores).enumerate() {
            let (Some(amount), Some(score)) = (amount, score) else {
                continue;
            };
            let anomalous = -score < offset;
            if anomalous {
                flagged.push(row);
            }
            overlay.push(ScatterPoint {
                row,
                date: date_idx.and_then(|idx| table.rows()[row][idx].as_date()),
                amount: *amount,
                anomalous,
            });
        }

        let anomalies = table
            .select_rows(&flagged)
            .with_column(ANOMALY, vec![Cell::Bool(true); flagged.len()])?;

        info!(
            rows = table.len(),
            scored = numeric.len(),
            anomalies = flagged.len(),
            contamination = self.config.contamination,
            "Anomaly detection complete"
        );

        Ok(AnomalyReport {
            anomalies,
            overlay,
            scores,
            offset,
            contamination: self.config.contamination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn amount_table(amounts: &[f64]) -> SalesTable {
        let start = NaiveDate::from_ymd_opt(2022, 4, 1).unwrap();
        SalesTable::new(
            vec!["Date".to_string(), "Amount".to_string(), "Qty".to_string()],
            amounts
                .iter()
                .enumerate()
                .map(|(i, &amount)| {
                    vec![
                        Cell::Date(start + chrono::Duration::days(i as i64 % 30)),
                        Cell::Number(amount),
                        Cell::Number(1.0),
                    ]
                })
                .collect(),
        )
    }

    fn spread_with_outlier() -> Vec<f64> {
        let mut amounts: Vec<f64> = (0..99).map(|i| 10.0 + i as f64 * 10.0 / 98.0).collect();
        amounts.insert(42, 10_000.0);
        amounts
    }

    #[test]
    fn test_flags_single_outlier() {
        let table = amount_table(&spread_with_outlier());
        let detector = AnomalyDetector::new(AnomalyConfig::default()).unwrap();

        let report = detector.detect(&table).unwrap();

        assert_eq!(report.anomalous_rows(), vec![42]);
        assert_eq!(report.anomaly_count(), 1);
        assert_eq!(report.anomalies.cell(0, "Amount"), Some(&Cell::Number(10_000.0)));
        assert_eq!(report.anomalies.cell(0, "anomaly"), Some(&Cell::Bool(true)));
        assert_eq!(report.overlay.len(), 100);
        assert_eq!(report.scores.len(), 100);
        // Input is untouched
        assert_eq!(table.columns().len(), 3);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let table = amount_table(&spread_with_outlier());
        let detector =
            AnomalyDetector::new(AnomalyConfig::default().with_seed(SeedPolicy::Fixed(9))).unwrap();

        let first = detector.detect(&table).unwrap();
        let second = detector.detect(&table).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        let table = SalesTable::from_text(&["Date", "Amount", "Qty"], &[]);
        let err = AnomalyDetector::default().detect(&table).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_single_distinct_amount_is_insufficient() {
        let table = amount_table(&[5.0, 5.0, 5.0, 5.0]);
        let err = AnomalyDetector::default().detect(&table).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn test_missing_amount_is_schema_error() {
        let table = SalesTable::from_text(&["Date", "Qty"], &[&["04-30-22", "1"]]);
        let err = AnomalyDetector::default().detect(&table).unwrap_err();
        assert!(matches!(err, AppError::SchemaError(_)));
    }

    #[test]
    fn test_non_numeric_amounts_are_never_flagged() {
        let mut rows: Vec<Vec<Cell>> = spread_with_outlier()
            .into_iter()
            .map(|amount| vec![Cell::Number(amount)])
            .collect();
        rows.push(vec![Cell::Null]);
        rows.push(vec![Cell::from_raw("n/a-ish")]);
        let table = SalesTable::new(vec!["Amount".to_string()], rows);

        let report = AnomalyDetector::default().detect(&table).unwrap();

        assert_eq!(report.scores[100], None);
        assert_eq!(report.scores[101], None);
        assert_eq!(report.overlay.len(), 100);
        assert!(report.overlay.iter().all(|p| p.date.is_none()));
        assert!(!report.anomalous_rows().contains(&101));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = AnomalyDetector::new(AnomalyConfig::default().with_contamination(0.0)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
