use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub fn run() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load()?;

    actix_web::rt::System::new().block_on(async move {
        let state = build_state(&config).await?;

        let sweeper = state.clone();
        actix_web::rt::spawn(async move {
            let mut interval = actix_web::rt::time::interval(SESSION_SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = sweeper.pipeline.sessions().purge_expired() {
                    warn!("Session sweep failed: {}", e);
                }
            }
        });

        info!(
            host = %config.server.host,
            port = config.server.port,
            "Starting HTTP server"
        );
        let server = start_server(
            state,
            &config.server.host,
            config.server.port,
            config.server.max_upload_bytes,
        )
        .map_err(|e| {
            error!(error = %e, "Failed to bind HTTP server");
            AppError::from(e)
        })?;

        server.await.map_err(AppError::from)
    })
}
