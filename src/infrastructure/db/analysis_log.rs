use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{error, info};

use super::AnalysisLog;
use crate::domain::error::{AppError, Result};
use crate::domain::sales::KpiSnapshot;
use crate::domain::user::AnalysisRecord;

/// `analysis_results` table backed audit log
#[derive(Clone)]
pub struct SqliteAnalysisLog {
    pool: SqlitePool,
}

impl SqliteAnalysisLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisLog for SqliteAnalysisLog {
    async fn append(&self, username: &str, kpi: &KpiSnapshot) -> Result<AnalysisRecord> {
        let result = sqlx::query_as::<_, AnalysisRecordEntity>(
            "INSERT INTO analysis_results (username, upload_time, total_rows, num_products, num_states)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, username, upload_time, total_rows, num_products, num_states",
        )
        .bind(username)
        .bind(Utc::now())
        .bind(kpi.total_rows as i64)
        .bind(kpi.num_products as i64)
        .bind(kpi.num_states as i64)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entity) => {
                info!(
                    username,
                    total_rows = kpi.total_rows,
                    num_products = kpi.num_products,
                    num_states = kpi.num_states,
                    "Analysis logged"
                );
                Ok(entity.into())
            }
            Err(e) => {
                error!(username, "Failed to log analysis: {}", e);
                Err(AppError::DatabaseError(format!(
                    "Failed to log analysis: {}",
                    e
                )))
            }
        }
    }

    async fn history(&self, username: &str, limit: i64) -> Result<Vec<AnalysisRecord>> {
        let limit = limit.clamp(1, 500);

        sqlx::query_as::<_, AnalysisRecordEntity>(
            "SELECT id, username, upload_time, total_rows, num_products, num_states
             FROM analysis_results WHERE username = ?
             ORDER BY upload_time DESC, id DESC LIMIT ?",
        )
        .bind(username)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct AnalysisRecordEntity {
    id: i64,
    username: String,
    upload_time: DateTime<Utc>,
    total_rows: i64,
    num_products: i64,
    num_states: i64,
}

impl From<AnalysisRecordEntity> for AnalysisRecord {
    fn from(e: AnalysisRecordEntity) -> Self {
        Self {
            id: e.id,
            username: e.username,
            upload_time: e.upload_time,
            total_rows: e.total_rows,
            num_products: e.num_products,
            num_states: e.num_states,
        }
    }
}
