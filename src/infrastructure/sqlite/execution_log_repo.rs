use super::columns::{self, date_text};
use super::SharedConnection;
use crate::domain::entities::execution_log::ExecutionLogEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::execution_log_repository::ExecutionLogRepository;
use chrono::NaiveDate;
use rusqlite::params;

const SELECT_COLS: &str = "id, instruction_id, account_id, execution_date, outcome, amount, units, valuation, \
    balance_before, balance_after, failure_reason, duration_ms, created_at";

pub struct SqliteExecutionLogRepo {
    conn: SharedConnection,
}

impl SqliteExecutionLogRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_entry(row: &rusqlite::Row) -> Result<ExecutionLogEntry, rusqlite::Error> {
        Ok(ExecutionLogEntry {
            id: row.get(0)?,
            instruction_id: row.get(1)?,
            account_id: row.get(2)?,
            execution_date: columns::date(row, 3)?,
            outcome: columns::parsed(row, 4)?,
            amount: columns::decimal(row, 5)?,
            units: columns::opt_decimal(row, 6)?,
            valuation: columns::opt_decimal(row, 7)?,
            balance_before: columns::opt_decimal(row, 8)?,
            balance_after: columns::opt_decimal(row, 9)?,
            failure_reason: row.get(10)?,
            duration_ms: row.get(11)?,
            created_at: columns::timestamp(row, 12)?,
        })
    }

    fn select(
        &self,
        filter_sql: &str,
        param: &dyn rusqlite::types::ToSql,
    ) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!("SELECT {SELECT_COLS} FROM execution_logs WHERE {filter_sql} ORDER BY id ASC");
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let entries = stmt
            .query_map(&[param][..], Self::row_to_entry)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(format!("Failed to read execution log: {e}")))?;
        Ok(entries)
    }
}

impl ExecutionLogRepository for SqliteExecutionLogRepo {
    fn append(&self, entry: &ExecutionLogEntry) -> Result<i64, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO execution_logs (instruction_id, account_id, execution_date, outcome, amount, units,
                valuation, balance_before, balance_after, failure_reason, duration_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                entry.instruction_id,
                entry.account_id,
                date_text(entry.execution_date),
                entry.outcome.to_string(),
                entry.amount.normalize().to_string(),
                entry.units.map(|u| u.normalize().to_string()),
                entry.valuation.map(|v| v.normalize().to_string()),
                entry.balance_before.map(|b| b.normalize().to_string()),
                entry.balance_after.map(|b| b.normalize().to_string()),
                entry.failure_reason,
                entry.duration_ms,
                entry.created_at.to_rfc3339(),
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to append execution log: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    fn for_instruction(&self, instruction_id: i64) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.select("instruction_id = ?1", &instruction_id)
    }

    fn for_date(&self, execution_date: NaiveDate) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.select("execution_date = ?1", &date_text(execution_date))
    }
}
