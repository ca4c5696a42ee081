use crate::domain::error::{AppError, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

const SCHEMA_V1: &str = include_str!("../../../resources/schema.sql");

/// Open the dashboard database and bring its schema up to date.
///
/// In-memory URLs get a single connection so every query sees the same
/// database.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse database URL: {e}")))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .pragma("foreign_keys", "ON");

    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { 4 })
        .acquire_timeout(Duration::from_secs(5));
    if in_memory {
        // Closing the only connection would drop the database
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {e}")))?;

    apply_migrations(&pool).await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {e}")))?;

    info!(database_url, "Database ready");
    Ok(pool)
}

async fn apply_migrations(pool: &SqlitePool) -> Result<()> {
    // PRAGMA user_version tracks the schema version; v1 == schema.sql.
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read user_version: {e}")))?;

    if version < 1 {
        apply_schema(pool, SCHEMA_V1).await?;
        sqlx::query("PRAGMA user_version = 1")
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to set user_version: {e}")))?;
    }

    Ok(())
}

async fn apply_schema(pool: &SqlitePool, schema: &str) -> Result<()> {
    for statement in schema.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply schema: {e}")))?;
    }
    Ok(())
}
