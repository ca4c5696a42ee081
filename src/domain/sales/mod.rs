// ============================================================
// SALES DOMAIN LAYER
// ============================================================
// Core types and value objects for the sales analysis pipeline
// No I/O, no async

mod aggregates;
mod anomaly;
mod cell;
mod pipeline_config;
mod table;

pub mod columns;

pub use aggregates::{CountBucket, Dashboard, DashboardFilter, KpiSnapshot, Section, TimePoint};
pub use anomaly::{AnomalyReport, ScatterPoint};
pub use cell::Cell;
pub use pipeline_config::{
    AnomalyConfig, CleaningConfig, FillPolicy, ResidualNullPolicy, SeedPolicy,
};
pub use table::{SalesTable, Upload};
