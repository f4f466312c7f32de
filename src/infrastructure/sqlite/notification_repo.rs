use super::columns;
use super::SharedConnection;
use crate::domain::entities::notification::{Notification, NotificationRequest};
use crate::domain::error::DomainError;
use crate::domain::ports::notification_emitter::NotificationEmitter;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;

/// Outbox of notification requests; delivery happens elsewhere.
pub struct SqliteNotificationSink {
    conn: SharedConnection,
}

impl SqliteNotificationSink {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    pub fn list(&self, account_id: i64) -> Result<Vec<Notification>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, account_id, title, message, severity, created_at FROM notifications
                 WHERE account_id = ?1 ORDER BY id ASC",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let notifications = stmt
            .query_map(params![account_id], |row| {
                Ok(Notification {
                    id: row.get(0)?,
                    request: NotificationRequest {
                        account_id: row.get(1)?,
                        title: row.get(2)?,
                        message: row.get(3)?,
                        severity: columns::parsed(row, 4)?,
                    },
                    created_at: columns::timestamp(row, 5)?,
                })
            })
            .map_err(|e| DomainError::Database(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(notifications)
    }
}

#[async_trait]
impl NotificationEmitter for SqliteNotificationSink {
    async fn emit(&self, request: &NotificationRequest) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Notification(e.to_string()))?;
        conn.execute(
            "INSERT INTO notifications (account_id, title, message, severity, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.account_id,
                request.title,
                request.message,
                request.severity.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Notification(format!("Failed to queue notification: {e}")))?;
        Ok(())
    }
}
