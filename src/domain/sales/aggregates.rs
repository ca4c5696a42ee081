// ============================================================
// AGGREGATE TYPES
// ============================================================
// KPI snapshot and chart-ready series handed to the dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::AppError;

/// Per-run KPI snapshot, also the payload of the analysis audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub total_rows: usize,

    /// Distinct `Category` values
    pub num_products: usize,

    /// Distinct `ship-state` values
    pub num_states: usize,
}

/// Total `Amount` for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Row count for one label of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountBucket {
    pub label: String,
    pub count: usize,
}

impl CountBucket {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Optional narrowing applied before aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    /// Inclusive lower date bound
    pub start: Option<NaiveDate>,

    /// Inclusive upper date bound
    pub end: Option<NaiveDate>,

    /// Keep only these `ship-state` values; empty keeps all
    #[serde(default)]
    pub states: Vec<String>,
}

impl DashboardFilter {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && self.states.is_empty()
    }
}

/// One dashboard section: either computed, or the reason it could not be.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    Unavailable { error: String, message: String },
}

impl<T> Section<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Unavailable { .. } => None,
        }
    }
}

impl<T> From<Result<T, AppError>> for Section<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(err) => Section::Unavailable {
                error: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }
}

/// Everything the dashboard page renders for one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub filter: DashboardFilter,
    pub kpis: Section<KpiSnapshot>,
    pub time_series: Section<Vec<TimePoint>>,
    pub categories: Section<Vec<CountBucket>>,
    pub states: Section<Vec<CountBucket>>,
    pub statuses: Section<Vec<CountBucket>>,
}
