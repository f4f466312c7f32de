use crate::domain::entities::notification::NotificationRequest;
use crate::domain::error::DomainError;
use async_trait::async_trait;

/// Fire-and-forget sink for user notifications. Callers log and discard errors.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, request: &NotificationRequest) -> Result<(), DomainError>;
}
