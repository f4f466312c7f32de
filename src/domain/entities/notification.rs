use crate::domain::values::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub account_id: i64,
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

/// A notification request as stored in the outbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(flatten)]
    pub request: NotificationRequest,
    pub created_at: DateTime<Utc>,
}
