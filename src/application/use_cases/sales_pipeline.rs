//! Sales Pipeline Use Case
//!
//! Wires the stages together for one session:
//! - Upload: load, clean, store the table in the session, log the KPIs
//! - Dashboard: aggregate the session table under an optional filter
//! - Anomalies: run the detector over the session table
//! - Export: CSV downloads of the cleaned table and of the anomalies

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::error::Result;
use crate::domain::sales::{
    AnomalyConfig, AnomalyReport, CleaningConfig, Dashboard, DashboardFilter, KpiSnapshot,
    SalesTable, Upload,
};
use crate::domain::session::SessionSummary;
use crate::domain::user::AnalysisRecord;
use crate::infrastructure::db::AnalysisLog;
use crate::infrastructure::tabular::TabularFormat;

use super::aggregator;
use super::anomaly_detector::AnomalyDetector;
use super::cleaner::{Cleaner, CleaningStats};
use super::exporter::{Exporter, DEFAULT_PART_ROWS};
use super::loader::Loader;
use super::session_store::SessionStore;

/// What an upload produced, returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub filename: String,
    pub format: TabularFormat,
    pub cleaning: CleaningStats,
    /// Export parts of `DEFAULT_PART_ROWS` rows the cleaned table splits into
    pub parts: usize,
    /// `None` when the table lacks `Category` or `ship-state`
    pub kpis: Option<KpiSnapshot>,
    /// Audit-log entry, when it could be written
    pub logged: Option<AnalysisRecord>,
    pub session: SessionSummary,
}

pub struct SalesPipeline {
    loader: Loader,
    cleaner: Cleaner,
    detector: AnomalyDetector,
    exporter: Exporter,
    sessions: Arc<SessionStore>,
    analysis_log: Arc<dyn AnalysisLog>,
}

impl SalesPipeline {
    pub fn new(
        cleaning: CleaningConfig,
        anomaly: AnomalyConfig,
        sessions: Arc<SessionStore>,
        analysis_log: Arc<dyn AnalysisLog>,
    ) -> Result<Self> {
        Ok(Self {
            loader: Loader::new(),
            cleaner: Cleaner::new(cleaning),
            detector: AnomalyDetector::new(anomaly)?,
            exporter: Exporter::new(),
            sessions,
            analysis_log,
        })
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Load and clean an upload without touching any session.
    pub fn ingest(&self, upload: &Upload) -> Result<(TabularFormat, SalesTable, CleaningStats)> {
        let (format, raw) = self.loader.load(upload)?;
        let (cleaned, stats) = self.cleaner.clean_with_stats(&raw)?;
        Ok((format, cleaned, stats))
    }

    /// Ingest `upload` into the session, replacing its previous table.
    /// A failed load or clean leaves the session untouched.
    pub async fn upload(&self, session_id: Uuid, upload: Upload) -> Result<UploadOutcome> {
        let username = self.sessions.username(session_id)?;
        let (format, table, cleaning) = self.ingest(&upload)?;

        let kpis = match aggregator::kpi_snapshot(&table) {
            Ok(kpis) => Some(kpis),
            Err(e) => {
                warn!(username = %username, "KPI snapshot unavailable: {}", e);
                None
            }
        };

        let parts = self.exporter.part_count(&table, DEFAULT_PART_ROWS)?;
        self.sessions.store_table(session_id, &upload.filename, table)?;

        let logged = match &kpis {
            Some(kpis) => match self.analysis_log.append(&username, kpis).await {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(username = %username, "Analysis log write failed: {}", e);
                    None
                }
            },
            None => None,
        };

        info!(
            username = %username,
            filename = %upload.filename,
            rows = cleaning.output_rows,
            "Upload processed"
        );

        Ok(UploadOutcome {
            filename: upload.filename,
            format,
            cleaning,
            parts,
            kpis,
            logged,
            session: self.sessions.touch(session_id)?,
        })
    }

    pub fn dashboard(&self, session_id: Uuid, filter: DashboardFilter) -> Result<Dashboard> {
        let table = self.sessions.table(session_id)?;
        Dashboard::build(&table, filter)
    }

    pub fn anomalies(&self, session_id: Uuid) -> Result<AnomalyReport> {
        let table = self.sessions.table(session_id)?;
        self.detector.detect(&table)
    }

    pub fn anomalies_csv(&self, session_id: Uuid) -> Result<Vec<u8>> {
        let report = self.anomalies(session_id)?;
        self.exporter.export_csv(&report.anomalies)
    }

    pub fn export_part(&self, session_id: Uuid, index: usize, rows_per_part: usize) -> Result<Vec<u8>> {
        let table = self.sessions.table(session_id)?;
        self.exporter.export_part(&table, index, rows_per_part)
    }

    /// Audit-log entries of the session's user, newest first.
    pub async fn history(&self, session_id: Uuid, limit: i64) -> Result<Vec<AnalysisRecord>> {
        let username = self.sessions.username(session_id)?;
        self.analysis_log.history(&username, limit).await
    }
}
