use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS instructions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            security_code TEXT NOT NULL,
            security_name TEXT NOT NULL,
            kind TEXT NOT NULL,
            amount TEXT NOT NULL,
            units TEXT,
            valuation TEXT,
            frequency TEXT,
            start_date TEXT NOT NULL,
            end_date TEXT,
            installment_cap INTEGER,
            lifecycle TEXT NOT NULL,
            last_outcome TEXT,
            next_execution_date TEXT,
            last_execution_date TEXT,
            execution_count INTEGER NOT NULL DEFAULT 0,
            failure_reason TEXT,
            stop_reason TEXT,
            is_locked INTEGER NOT NULL DEFAULT 0,
            locked_at_ms INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS accounts (
            account_id INTEGER PRIMARY KEY,
            balance TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS holdings (
            account_id INTEGER NOT NULL,
            security_code TEXT NOT NULL,
            security_name TEXT NOT NULL,
            units TEXT NOT NULL,
            invested TEXT NOT NULL,
            last_valuation TEXT,
            last_valuation_date TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (account_id, security_code)
        );

        CREATE TABLE IF NOT EXISTS execution_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instruction_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            execution_date TEXT NOT NULL,
            outcome TEXT NOT NULL,
            amount TEXT NOT NULL,
            units TEXT,
            valuation TEXT,
            balance_before TEXT,
            balance_after TEXT,
            failure_reason TEXT,
            duration_ms INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS valuations (
            security_code TEXT NOT NULL,
            as_of TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (security_code, as_of)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            message TEXT NOT NULL,
            severity TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_instructions_due ON instructions(lifecycle, is_locked, next_execution_date);
        CREATE INDEX IF NOT EXISTS idx_instructions_account ON instructions(account_id);
        CREATE INDEX IF NOT EXISTS idx_logs_instruction ON execution_logs(instruction_id, execution_date);
        CREATE INDEX IF NOT EXISTS idx_logs_date ON execution_logs(execution_date);
        CREATE INDEX IF NOT EXISTS idx_notifications_account ON notifications(account_id);
        "
    ).map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
