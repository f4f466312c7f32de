use crate::domain::entities::execution_log::ExecutionLogEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::execution_log_repository::ExecutionLogRepository;
use chrono::NaiveDate;
use std::sync::Arc;

pub struct HistoryUseCase {
    repo: Arc<dyn ExecutionLogRepository>,
}

impl HistoryUseCase {
    pub fn new(repo: Arc<dyn ExecutionLogRepository>) -> Self {
        Self { repo }
    }

    /// Audit entries for one instruction, oldest first.
    pub fn for_instruction(&self, instruction_id: i64) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.repo.for_instruction(instruction_id)
    }

    pub fn for_date(&self, execution_date: NaiveDate) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.repo.for_date(execution_date)
    }
}
