pub mod analysis_log;
pub mod connection;
pub mod users;

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::sales::KpiSnapshot;
use crate::domain::user::AnalysisRecord;

pub use analysis_log::SqliteAnalysisLog;
pub use connection::connect;
pub use users::UserRepository;

/// Append-only audit log of analysis runs, keyed by username and time.
#[async_trait]
pub trait AnalysisLog: Send + Sync {
    async fn append(&self, username: &str, kpi: &KpiSnapshot) -> Result<AnalysisRecord>;
    async fn history(&self, username: &str, limit: i64) -> Result<Vec<AnalysisRecord>>;
}
