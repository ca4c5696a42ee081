use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::sales::KpiSnapshot;

/// A registered dashboard user. The password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// One row of the analysis audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub username: String,
    pub upload_time: DateTime<Utc>,
    pub total_rows: i64,
    pub num_products: i64,
    pub num_states: i64,
}

impl AnalysisRecord {
    pub fn kpi(&self) -> KpiSnapshot {
        KpiSnapshot {
            total_rows: self.total_rows.max(0) as usize,
            num_products: self.num_products.max(0) as usize,
            num_states: self.num_states.max(0) as usize,
        }
    }
}
