pub mod columns;
pub mod execution_log_repo;
pub mod instruction_repo;
pub mod ledger_repo;
pub mod migrations;
pub mod notification_repo;
pub mod valuation_repo;

use crate::domain::error::DomainError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One connection shared by every adapter of a facade, so `:memory:`
/// databases see a single schema.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Opens a database, enables WAL and a busy timeout so concurrent
/// processes wait on each other, and applies migrations.
pub fn open_connection(db_path: &str, busy_timeout: Duration) -> Result<SharedConnection, DomainError> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    conn.busy_timeout(busy_timeout)
        .map_err(|e| DomainError::Database(format!("Busy timeout error: {e}")))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    migrations::run_migrations(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}
