use crate::domain::values::execution_outcome::ExecutionOutcome;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One immutable audit record per dispatch attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: i64,
    pub instruction_id: i64,
    pub account_id: i64,
    /// The due date being serviced, not wall-clock time.
    pub execution_date: NaiveDate,
    pub outcome: ExecutionOutcome,
    pub amount: Decimal,
    pub units: Option<Decimal>,
    pub valuation: Option<Decimal>,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub failure_reason: Option<String>,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
}
