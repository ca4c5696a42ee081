use crate::domain::error::{AppError, Result};
use crate::domain::user::User;
use crate::infrastructure::security::password::PasswordHash;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Accounts allowed to use the dashboard.
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new user; a taken username is a `ValidationError`.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let stored = PasswordHash::generate(password);

        let result = sqlx::query_as::<_, UserEntity>(
            "INSERT INTO users (username, password_hash, password_salt, created_at)
             VALUES (?, ?, ?, ?) RETURNING id, username, password_hash, password_salt",
        )
        .bind(username)
        .bind(&stored.hash)
        .bind(&stored.salt)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entity) => {
                info!(username, "Registered user");
                Ok(entity.into())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                warn!(username, "Registration rejected: username taken");
                Err(AppError::ValidationError(format!(
                    "username '{}' already exists",
                    username
                )))
            }
            Err(e) => Err(AppError::DatabaseError(format!(
                "Failed to register user: {}",
                e
            ))),
        }
    }

    /// The user when `password` matches, `None` otherwise.
    pub async fn verify(&self, username: &str, password: &str) -> Result<Option<User>> {
        let entity = sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, password_hash, password_salt FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to look up user: {}", e)))?;

        Ok(entity.and_then(|entity| {
            let stored = PasswordHash {
                hash: entity.password_hash.clone(),
                salt: entity.password_salt.clone(),
            };
            stored.verify(password).then(|| entity.into())
        }))
    }

    /// Create the account unless one with that name exists already.
    pub async fn ensure_user(&self, username: &str, password: &str) -> Result<()> {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to look up user: {}", e)))?;

        if exists.is_none() {
            self.register(username, password).await?;
        }
        Ok(())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct UserEntity {
    id: i64,
    username: String,
    password_hash: String,
    password_salt: String,
}

impl From<UserEntity> for User {
    fn from(e: UserEntity) -> Self {
        Self {
            id: e.id,
            username: e.username,
        }
    }
}
