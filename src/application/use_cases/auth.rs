//! Auth Use Case
//!
//! Registration, login and logout on top of the user table and the
//! in-memory session store.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::session::SessionSummary;
use crate::domain::user::User;
use crate::infrastructure::db::UserRepository;

use super::session_store::SessionStore;

pub struct AuthUseCase {
    users: UserRepository,
    sessions: Arc<SessionStore>,
}

impl AuthUseCase {
    pub fn new(users: UserRepository, sessions: Arc<SessionStore>) -> Self {
        Self { users, sessions }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        self.users.register(username.trim(), password).await
    }

    /// Check credentials and open a session.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionSummary> {
        let username = username.trim();
        match self.users.verify(username, password).await? {
            Some(user) => {
                info!(username = %user.username, "Login succeeded");
                self.sessions.create(&user.username)
            }
            None => {
                warn!(username, "Login failed");
                Err(AppError::Unauthorized(
                    "invalid username or password".to_string(),
                ))
            }
        }
    }

    pub fn logout(&self, session_id: Uuid) -> Result<()> {
        if self.sessions.destroy(session_id)? {
            Ok(())
        } else {
            Err(AppError::Unauthorized("unknown session".to_string()))
        }
    }

    /// Username behind a live session.
    pub fn authenticate(&self, session_id: Uuid) -> Result<String> {
        self.sessions.username(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::connect;
    use chrono::Duration;

    async fn setup() -> AuthUseCase {
        let pool = connect("sqlite::memory:").await.unwrap();
        AuthUseCase::new(
            UserRepository::new(pool),
            Arc::new(SessionStore::new(Duration::minutes(60))),
        )
    }

    #[tokio::test]
    async fn test_register_login_logout() {
        let auth = setup().await;
        auth.register("analyst", "secret-pw").await.unwrap();

        let session = auth.login("analyst", "secret-pw").await.unwrap();
        assert_eq!(session.username, "analyst");
        assert_eq!(auth.authenticate(session.session_id).unwrap(), "analyst");

        auth.logout(session.session_id).unwrap();
        assert!(matches!(
            auth.authenticate(session.session_id),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let auth = setup().await;
        auth.register("analyst", "secret-pw").await.unwrap();

        let err = auth.login("analyst", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = auth.login("ghost", "secret-pw").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let auth = setup().await;
        auth.register("analyst", "secret-pw").await.unwrap();
        let err = auth.register("analyst", "other-pw").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
