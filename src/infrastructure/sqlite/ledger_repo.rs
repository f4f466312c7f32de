use super::columns::{self, date_text};
use super::SharedConnection;
use crate::domain::entities::holding::Holding;
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_repository::*;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;

const HOLDING_COLS: &str =
    "account_id, security_code, security_name, units, invested, last_valuation, last_valuation_date";

/// Ledger adapter. Each mutation runs in its own `BEGIN IMMEDIATE`
/// transaction so the read-check-write on a row is atomic across
/// connections.
pub struct SqliteLedgerRepo {
    conn: SharedConnection,
}

impl SqliteLedgerRepo {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    fn row_to_holding(row: &rusqlite::Row) -> Result<Holding, rusqlite::Error> {
        Ok(Holding {
            account_id: row.get(0)?,
            security_code: row.get(1)?,
            security_name: row.get(2)?,
            units: columns::decimal(row, 3)?,
            invested: columns::decimal(row, 4)?,
            last_valuation: columns::opt_decimal(row, 5)?,
            last_valuation_date: columns::opt_date(row, 6)?,
        })
    }

    fn read_balance(conn: &Connection, account_id: i64) -> Result<Decimal, DomainError> {
        let balance = conn
            .query_row(
                "SELECT balance FROM accounts WHERE account_id = ?1",
                params![account_id],
                |row| columns::decimal(row, 0),
            )
            .optional()
            .map_err(|e| DomainError::Database(format!("Failed to read balance: {e}")))?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    fn write_balance(conn: &Connection, account_id: i64, balance: Decimal) -> Result<(), DomainError> {
        conn.execute(
            "INSERT INTO accounts (account_id, balance, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(account_id) DO UPDATE SET balance = excluded.balance, updated_at = excluded.updated_at",
            params![account_id, balance.normalize().to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| DomainError::Database(format!("Failed to write balance: {e}")))?;
        Ok(())
    }

    fn read_holding(
        conn: &Connection,
        account_id: i64,
        security_code: &str,
    ) -> Result<Option<Holding>, DomainError> {
        let sql = format!(
            "SELECT {HOLDING_COLS} FROM holdings WHERE account_id = ?1 AND security_code = ?2"
        );
        conn.query_row(&sql, params![account_id, security_code], Self::row_to_holding)
            .optional()
            .map_err(|e| DomainError::Database(format!("Failed to read holding: {e}")))
    }

    fn write_holding(conn: &Connection, holding: &Holding) -> Result<(), DomainError> {
        conn.execute(
            "INSERT INTO holdings (account_id, security_code, security_name, units, invested,
                last_valuation, last_valuation_date, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(account_id, security_code) DO UPDATE SET
                security_name = excluded.security_name, units = excluded.units, invested = excluded.invested,
                last_valuation = excluded.last_valuation, last_valuation_date = excluded.last_valuation_date,
                updated_at = excluded.updated_at",
            params![
                holding.account_id,
                holding.security_code,
                holding.security_name,
                holding.units.normalize().to_string(),
                holding.invested.normalize().to_string(),
                holding.last_valuation.map(|v| v.normalize().to_string()),
                holding.last_valuation_date.map(date_text),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to write holding: {e}")))?;
        Ok(())
    }
}

fn overflow(what: &str) -> DomainError {
    DomainError::InvalidInput(format!("Arithmetic overflow computing {what}"))
}

impl LedgerRepository for SqliteLedgerRepo {
    fn balance(&self, account_id: i64) -> Result<Decimal, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Self::read_balance(&conn, account_id)
    }

    fn credit(&self, account_id: i64, amount: Decimal) -> Result<Decimal, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!("Cannot credit negative amount {amount}")));
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = Self::read_balance(&tx, account_id)?;
        let updated = current.checked_add(amount).ok_or_else(|| overflow("balance"))?;
        Self::write_balance(&tx, account_id, updated)?;
        tx.commit()?;
        Ok(updated)
    }

    fn debit(&self, account_id: i64, amount: Decimal) -> Result<Decimal, DomainError> {
        if amount < Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!("Cannot debit negative amount {amount}")));
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = Self::read_balance(&tx, account_id)?;
        if current < amount {
            return Err(DomainError::InsufficientBalance {
                required: amount.to_string(),
                available: current.to_string(),
            });
        }
        let updated = current - amount;
        Self::write_balance(&tx, account_id, updated)?;
        tx.commit()?;
        Ok(updated)
    }

    fn holding(&self, account_id: i64, security_code: &str) -> Result<Option<Holding>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Self::read_holding(&conn, account_id, security_code)
    }

    fn holdings(&self, account_id: i64) -> Result<Vec<Holding>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let sql = format!(
            "SELECT {HOLDING_COLS} FROM holdings WHERE account_id = ?1 ORDER BY security_code ASC"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let holdings = stmt
            .query_map(params![account_id], Self::row_to_holding)
            .map_err(|e| DomainError::Database(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Database(format!("Failed to read holdings: {e}")))?;
        Ok(holdings)
    }

    fn add_units(&self, change: &HoldingChange<'_>, cost: Decimal) -> Result<Holding, DomainError> {
        if change.units <= Decimal::ZERO || cost < Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!(
                "Cannot add {} units at cost {cost}",
                change.units
            )));
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let holding = match Self::read_holding(&tx, change.account_id, change.security_code)? {
            Some(existing) => Holding {
                units: existing.units.checked_add(change.units).ok_or_else(|| overflow("units"))?,
                invested: existing.invested.checked_add(cost).ok_or_else(|| overflow("invested"))?,
                last_valuation: Some(change.valuation),
                last_valuation_date: Some(change.valuation_date),
                ..existing
            },
            None => Holding {
                account_id: change.account_id,
                security_code: change.security_code.to_string(),
                security_name: change.security_name.to_string(),
                units: change.units,
                invested: cost,
                last_valuation: Some(change.valuation),
                last_valuation_date: Some(change.valuation_date),
            },
        };
        Self::write_holding(&tx, &holding)?;
        tx.commit()?;
        Ok(holding)
    }

    fn remove_units(&self, change: &HoldingChange<'_>) -> Result<Decimal, DomainError> {
        if change.units <= Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!("Cannot remove {} units", change.units)));
        }
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let existing = Self::read_holding(&tx, change.account_id, change.security_code)?;
        let held = existing.as_ref().map_or(Decimal::ZERO, |h| h.units);
        let Some(existing) = existing.filter(|h| h.units >= change.units) else {
            return Err(DomainError::InsufficientUnits {
                required: change.units.to_string(),
                held: held.to_string(),
            });
        };

        let remaining = existing.units - change.units;
        let cost_removed = if remaining.is_zero() {
            tx.execute(
                "DELETE FROM holdings WHERE account_id = ?1 AND security_code = ?2",
                params![change.account_id, change.security_code],
            )
            .map_err(|e| DomainError::Database(format!("Failed to delete holding: {e}")))?;
            existing.invested
        } else {
            let cost_removed = change
                .units
                .checked_mul(existing.cost_per_unit())
                .ok_or_else(|| overflow("cost basis"))?;
            let invested = (existing.invested - cost_removed).max(Decimal::ZERO);
            Self::write_holding(
                &tx,
                &Holding {
                    units: remaining,
                    invested,
                    last_valuation: Some(change.valuation),
                    last_valuation_date: Some(change.valuation_date),
                    ..existing.clone()
                },
            )?;
            existing.invested - invested
        };
        tx.commit()?;
        Ok(cost_removed)
    }
}
