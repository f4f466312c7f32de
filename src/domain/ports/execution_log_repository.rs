use crate::domain::entities::execution_log::ExecutionLogEntry;
use crate::domain::error::DomainError;
use chrono::NaiveDate;

/// Append-only audit log.
pub trait ExecutionLogRepository: Send + Sync {
    fn append(&self, entry: &ExecutionLogEntry) -> Result<i64, DomainError>;
    fn for_instruction(&self, instruction_id: i64) -> Result<Vec<ExecutionLogEntry>, DomainError>;
    fn for_date(&self, execution_date: NaiveDate) -> Result<Vec<ExecutionLogEntry>, DomainError>;
}
