//! Session Store
//!
//! In-memory registry of logged-in sessions. Each session owns its own
//! cleaned table, so concurrent users never see each other's data.
//! Idle sessions are discarded lazily on access and by `purge_expired`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::sales::SalesTable;
use crate::domain::session::{SessionContext, SessionSummary};

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionContext>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, SessionContext>>> {
        self.sessions
            .lock()
            .map_err(|e| AppError::Internal(format!("Session store lock poisoned: {}", e)))
    }

    /// Open a fresh session for `username`.
    pub fn create(&self, username: &str) -> Result<SessionSummary> {
        let session = SessionContext::new(username, Utc::now());
        let summary = session.summary(self.timeout);
        self.lock()?.insert(session.id, session);
        info!(username, session_id = %summary.session_id, "Session created");
        Ok(summary)
    }

    /// Look up a live session and mark it as seen. Expired sessions are
    /// removed and reported as `Unauthorized`.
    pub fn touch(&self, id: Uuid) -> Result<SessionSummary> {
        self.with_session(id, |session| Ok(session.summary(self.timeout)))
    }

    pub fn username(&self, id: Uuid) -> Result<String> {
        self.with_session(id, |session| Ok(session.username.clone()))
    }

    /// Replace the session's table with a new upload.
    pub fn store_table(
        &self,
        id: Uuid,
        filename: &str,
        table: SalesTable,
    ) -> Result<Arc<SalesTable>> {
        self.with_session(id, |session| {
            Ok(session.replace_table(filename, table, Utc::now()))
        })
    }

    /// Table of the session's latest upload; `NotFound` before the first one.
    pub fn table(&self, id: Uuid) -> Result<Arc<SalesTable>> {
        self.with_session(id, |session| {
            session
                .table()
                .ok_or_else(|| AppError::NotFound("no file uploaded in this session".to_string()))
        })
    }

    pub fn destroy(&self, id: Uuid) -> Result<bool> {
        let removed = self.lock()?.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session destroyed");
        }
        Ok(removed)
    }

    /// Drop every idle session; returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.timeout));
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionContext) -> Result<T>,
    ) -> Result<T> {
        let now = Utc::now();
        let mut sessions = self.lock()?;

        let expired = match sessions.get(&id) {
            None => return Err(AppError::Unauthorized("unknown session".to_string())),
            Some(session) => session.is_expired(now, self.timeout),
        };
        if expired {
            sessions.remove(&id);
            debug!(session_id = %id, "Session expired");
            return Err(AppError::Unauthorized("session expired".to_string()));
        }

        match sessions.get_mut(&id) {
            Some(session) => {
                session.touch(now);
                f(session)
            }
            None => Err(AppError::Unauthorized("unknown session".to_string())),
        }
    }
}
