use std::sync::{Arc, Mutex};

use actix_web::web;
use tracing::{error, info};

use crate::application::{AuthUseCase, SalesPipeline, SessionStore};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::{connect, SqliteAnalysisLog, UserRepository};
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Open the database, seed the optional admin account and wire the use
/// cases into the shared HTTP state.
pub async fn build_state(config: &AppConfig) -> Result<web::Data<HttpState>> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = connect(&config.database.url).await.map_err(|err| {
        error!(error = %err, url = %config.database.url, "Failed to open database");
        err
    })?;

    let users = UserRepository::new(pool.clone());
    if let Some(admin) = &config.bootstrap_admin {
        users.ensure_user(&admin.username, &admin.password).await?;
        info!(username = %admin.username, "Bootstrap admin ensured");
    }

    let sessions = Arc::new(SessionStore::new(config.session_timeout()));
    let pipeline = SalesPipeline::new(
        config.cleaning,
        config.anomaly.clone(),
        Arc::clone(&sessions),
        Arc::new(SqliteAnalysisLog::new(pool)),
    )?;
    let auth = AuthUseCase::new(users, sessions);

    add_log(
        &logs,
        "INFO",
        "Bootstrap",
        &format!(
            "Ready (database={}, session timeout={}m)",
            config.database.url, config.session.timeout_minutes
        ),
    );

    Ok(web::Data::new(HttpState {
        auth,
        pipeline,
        logs,
    }))
}
