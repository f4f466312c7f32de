use super::columns::{self, date_text};
use super::SharedConnection;
use crate::domain::entities::instruction::Instruction;
use crate::domain::error::DomainError;
use crate::domain::ports::instruction_repository::*;
use crate::domain::values::lifecycle::{AttemptOutcome, LifecycleState};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};

const SELECT_COLS: &str = "id, account_id, security_code, security_name, kind, amount, units, valuation, \
    frequency, start_date, end_date, installment_cap, lifecycle, last_outcome, next_execution_date, \
    last_execution_date, execution_count, failure_reason, stop_reason, is_locked, locked_at_ms, \
    created_at, updated_at";

pub struct SqliteInstructionRepo {
    conn: SharedConnection,
}

impl SqliteInstructionRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_instruction(row: &rusqlite::Row) -> Result<Instruction, rusqlite::Error> {
        let cap: Option<i64> = row.get(11)?;
        let count: i64 = row.get(16)?;
        let locked: i32 = row.get(19)?;
        let locked_at_ms: Option<i64> = row.get(20)?;

        Ok(Instruction {
            id: row.get(0)?,
            account_id: row.get(1)?,
            security_code: row.get(2)?,
            security_name: row.get(3)?,
            kind: columns::parsed(row, 4)?,
            amount: columns::decimal(row, 5)?,
            units: columns::opt_decimal(row, 6)?,
            valuation: columns::opt_decimal(row, 7)?,
            frequency: columns::opt_parsed(row, 8)?,
            start_date: columns::date(row, 9)?,
            end_date: columns::opt_date(row, 10)?,
            installment_cap: cap.map(|c| c.max(0) as u32),
            lifecycle: columns::parsed(row, 12)?,
            last_outcome: columns::opt_parsed(row, 13)?,
            next_execution_date: columns::opt_date(row, 14)?,
            last_execution_date: columns::opt_date(row, 15)?,
            execution_count: count.max(0) as u32,
            failure_reason: row.get(17)?,
            stop_reason: row.get(18)?,
            is_locked: locked != 0,
            locked_at: locked_at_ms.and_then(DateTime::<Utc>::from_timestamp_millis),
            created_at: columns::timestamp(row, 21)?,
            updated_at: columns::timestamp(row, 22)?,
        })
    }

    /// Decodes rows, logging and dropping any that no longer parse so one
    /// corrupt row cannot hide the rest of the schedule.
    fn collect_rows(
        rows: impl Iterator<Item = Result<Instruction, rusqlite::Error>>,
    ) -> Vec<Instruction> {
        rows.filter_map(|r| match r {
            Ok(i) => Some(i),
            Err(e) => {
                tracing::error!(error = %e, "Skipping undecodable instruction row");
                None
            }
        })
        .collect()
    }
}

fn expect_row(rows: usize, id: i64) -> Result<(), DomainError> {
    if rows == 0 {
        return Err(DomainError::NotFound(format!("Instruction not found: {id}")));
    }
    Ok(())
}

impl InstructionRepository for SqliteInstructionRepo {
    fn add(&self, instruction: &Instruction) -> Result<i64, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO instructions (account_id, security_code, security_name, kind, amount, units, valuation,
                frequency, start_date, end_date, installment_cap, lifecycle, last_outcome, next_execution_date,
                last_execution_date, execution_count, failure_reason, stop_reason, is_locked, locked_at_ms,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)",
            params![
                instruction.account_id,
                instruction.security_code,
                instruction.security_name,
                instruction.kind.to_string(),
                instruction.amount.to_string(),
                instruction.units.map(|u| u.to_string()),
                instruction.valuation.map(|v| v.to_string()),
                instruction.frequency.map(|f| f.to_string()),
                date_text(instruction.start_date),
                instruction.end_date.map(date_text),
                instruction.installment_cap.map(i64::from),
                instruction.lifecycle.to_string(),
                instruction.last_outcome.map(|o| o.to_string()),
                instruction.next_execution_date.map(date_text),
                instruction.last_execution_date.map(date_text),
                i64::from(instruction.execution_count),
                instruction.failure_reason,
                instruction.stop_reason,
                instruction.is_locked as i32,
                instruction.locked_at.map(|t| t.timestamp_millis()),
                instruction.created_at.to_rfc3339(),
                instruction.updated_at.to_rfc3339(),
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to add instruction: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    fn get(&self, id: i64) -> Result<Option<Instruction>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!("SELECT {SELECT_COLS} FROM instructions WHERE id = ?1");
        conn.query_row(&sql, params![id], Self::row_to_instruction)
            .optional()
            .map_err(|e| DomainError::Database(format!("Failed to load instruction {id}: {e}")))
    }

    fn list(&self, filter: &InstructionFilter) -> Result<Vec<Instruction>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut sql = format!("SELECT {SELECT_COLS} FROM instructions WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(account_id) = filter.account_id {
            sql.push_str(&format!(" AND account_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(account_id));
        }
        if let Some(lifecycle) = &filter.lifecycle {
            sql.push_str(&format!(" AND lifecycle = ?{}", param_values.len() + 1));
            param_values.push(Box::new(lifecycle.to_string()));
        }
        sql.push_str(" ORDER BY id ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::row_to_instruction)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(Self::collect_rows(rows))
    }

    fn find_due(&self, target: NaiveDate) -> Result<Vec<Instruction>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!(
            "SELECT {SELECT_COLS} FROM instructions
             WHERE lifecycle IN ('pending', 'active')
               AND is_locked = 0
               AND next_execution_date IS NOT NULL
               AND next_execution_date <= ?1
               AND (last_execution_date IS NULL OR last_execution_date < ?1)
               AND (installment_cap IS NULL OR execution_count < installment_cap)
             ORDER BY next_execution_date ASC, id ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![date_text(target)], Self::row_to_instruction)
            .map_err(|e| DomainError::Database(format!("Failed to select due instructions: {e}")))?;
        Ok(Self::collect_rows(rows))
    }

    fn try_lock(&self, id: i64, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn
            .execute(
                "UPDATE instructions SET is_locked = 1, locked_at_ms = ?1, updated_at = ?2
                 WHERE id = ?3 AND is_locked = 0",
                params![now.timestamp_millis(), now.to_rfc3339(), id],
            )
            .map_err(|e| DomainError::Database(format!("Failed to lock instruction {id}: {e}")))?;
        Ok(rows == 1)
    }

    fn unlock(&self, id: i64) -> Result<bool, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn
            .execute(
                "UPDATE instructions SET is_locked = 0, locked_at_ms = NULL, updated_at = ?1 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| DomainError::Database(format!("Failed to unlock instruction {id}: {e}")))?;
        Ok(rows > 0)
    }

    fn release_stale_locks(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "UPDATE instructions SET is_locked = 0, locked_at_ms = NULL, updated_at = ?1
             WHERE is_locked = 1 AND (locked_at_ms IS NULL OR locked_at_ms < ?2)",
            params![Utc::now().to_rfc3339(), cutoff.timestamp_millis()],
        )
        .map_err(|e| DomainError::Database(format!("Failed to release stale locks: {e}")))
    }

    fn record_success(&self, id: i64, update: &ExecutionSuccess) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn.execute(
            "UPDATE instructions SET lifecycle = ?1, last_outcome = ?2, last_execution_date = ?3,
                next_execution_date = ?4, execution_count = execution_count + 1, failure_reason = NULL,
                units = ?5, valuation = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                LifecycleState::Active.to_string(),
                AttemptOutcome::Success.to_string(),
                date_text(update.execution_date),
                update.next_execution_date.map(date_text),
                update.units.to_string(),
                update.valuation.to_string(),
                Utc::now().to_rfc3339(),
                id,
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to record success for {id}: {e}")))?;
        expect_row(rows, id)
    }

    fn record_failure(&self, id: i64, reason: &str) -> Result<(), DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn.execute(
            "UPDATE instructions SET lifecycle = ?1, last_outcome = ?2, failure_reason = ?3, updated_at = ?4
             WHERE id = ?5 AND lifecycle != 'cancelled'",
            params![
                LifecycleState::Pending.to_string(),
                AttemptOutcome::Failed.to_string(),
                reason,
                Utc::now().to_rfc3339(),
                id,
            ],
        ).map_err(|e| DomainError::Database(format!("Failed to record failure for {id}: {e}")))?;
        expect_row(rows, id)
    }

    fn cancel(&self, id: i64, reason: &str) -> Result<bool, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = conn.execute(
            "UPDATE instructions SET
                stop_reason = CASE WHEN lifecycle = 'cancelled' THEN stop_reason ELSE ?1 END,
                lifecycle = 'cancelled', next_execution_date = NULL, updated_at = ?2
             WHERE id = ?3",
            params![reason, Utc::now().to_rfc3339(), id],
        ).map_err(|e| DomainError::Database(format!("Failed to cancel instruction {id}: {e}")))?;
        Ok(rows > 0)
    }
}
