use crate::domain::entities::instruction::Instruction;
use crate::domain::error::DomainError;
use crate::domain::values::lifecycle::LifecycleState;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default)]
pub struct InstructionFilter {
    pub account_id: Option<i64>,
    pub lifecycle: Option<LifecycleState>,
    pub limit: Option<usize>,
}

/// Scheduling fields written after a successful execution.
#[derive(Debug, Clone)]
pub struct ExecutionSuccess {
    pub execution_date: NaiveDate,
    pub next_execution_date: Option<NaiveDate>,
    pub units: Decimal,
    pub valuation: Decimal,
}

/// Instruction store including the embedded lease.
pub trait InstructionRepository: Send + Sync {
    fn add(&self, instruction: &Instruction) -> Result<i64, DomainError>;
    fn get(&self, id: i64) -> Result<Option<Instruction>, DomainError>;
    fn list(&self, filter: &InstructionFilter) -> Result<Vec<Instruction>, DomainError>;

    /// Schedulable, unlocked instructions due on or before `target` that have
    /// not already run on `target`, oldest due date first.
    fn find_due(&self, target: NaiveDate) -> Result<Vec<Instruction>, DomainError>;

    /// Atomic test-and-set of the lock flag. `false` means another caller
    /// holds it.
    fn try_lock(&self, id: i64, now: DateTime<Utc>) -> Result<bool, DomainError>;

    /// Clears the lock unconditionally. Returns `false` when no row matched.
    fn unlock(&self, id: i64) -> Result<bool, DomainError>;

    /// Clears locks stamped before `cutoff`; returns how many were released.
    fn release_stale_locks(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError>;

    fn record_success(&self, id: i64, update: &ExecutionSuccess) -> Result<(), DomainError>;

    /// Back to pending with the same due date and the reason persisted.
    fn record_failure(&self, id: i64, reason: &str) -> Result<(), DomainError>;

    /// Terminal transition. Returns `false` when no row matched.
    fn cancel(&self, id: i64, reason: &str) -> Result<bool, DomainError>;
}
