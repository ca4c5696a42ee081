use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::sales::SalesTable;

/// Per-login analysis context.
///
/// Created at login, destroyed at logout or once idle for longer than the
/// configured timeout. Owns the cleaned table of the latest upload.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub upload: Option<SessionUpload>,
}

/// The cleaned table currently held by a session.
#[derive(Debug, Clone)]
pub struct SessionUpload {
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub table: Arc<SalesTable>,
}

impl SessionContext {
    pub fn new(username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            created_at: now,
            last_seen: now,
            upload: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_seen > timeout
    }

    pub fn expires_at(&self, timeout: Duration) -> DateTime<Utc> {
        self.last_seen + timeout
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
    }

    /// A new upload replaces whatever table the session held.
    pub fn replace_table(
        &mut self,
        filename: impl Into<String>,
        table: SalesTable,
        now: DateTime<Utc>,
    ) -> Arc<SalesTable> {
        let table = Arc::new(table);
        self.upload = Some(SessionUpload {
            filename: filename.into(),
            uploaded_at: now,
            table: Arc::clone(&table),
        });
        table
    }

    /// Table of the latest upload, if any.
    pub fn table(&self) -> Option<Arc<SalesTable>> {
        self.upload.as_ref().map(|u| Arc::clone(&u.table))
    }

    pub fn summary(&self, timeout: Duration) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            username: self.username.clone(),
            expires_at: self.expires_at(timeout),
            filename: self.upload.as_ref().map(|u| u.filename.clone()),
            rows: self.upload.as_ref().map(|u| u.table.len()),
        }
    }
}

/// Client-facing view of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub username: String,
    pub expires_at: DateTime<Utc>,
    pub filename: Option<String>,
    pub rows: Option<usize>,
}
