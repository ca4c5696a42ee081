// ============================================================
// ANOMALY REPORT
// ============================================================

use chrono::NaiveDate;
use serde::Serialize;

use super::SalesTable;

/// One point of the Date/Amount scatter overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    /// Row index in the analysed table
    pub row: usize,
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub anomalous: bool,
}

/// Result of one anomaly detection run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    /// Anomalous rows in original order, input schema plus an `anomaly` column
    pub anomalies: SalesTable,

    /// Every scored row, for the normal-vs-anomalous scatter chart
    pub overlay: Vec<ScatterPoint>,

    /// Isolation score per input row (`None` when `Amount` is not numeric)
    pub scores: Vec<Option<f64>>,

    /// Decision offset on the negated score
    pub offset: f64,

    pub contamination: f64,
}

impl AnomalyReport {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }

    /// Row indices (in the analysed table) flagged as anomalous.
    pub fn anomalous_rows(&self) -> Vec<usize> {
        self.overlay
            .iter()
            .filter(|p| p.anomalous)
            .map(|p| p.row)
            .collect()
    }
}
