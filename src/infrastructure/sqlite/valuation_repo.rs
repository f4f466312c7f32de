use super::columns::{self, date_text};
use super::SharedConnection;
use crate::domain::entities::valuation::Valuation;
use crate::domain::error::DomainError;
use crate::domain::ports::valuation_reader::ValuationReader;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;

/// Reads prices from the `valuations` table filled by the market-data
/// ingestion job.
pub struct SqliteValuationReader {
    conn: SharedConnection,
}

impl SqliteValuationReader {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Upserts a price point. Used for seeding and operator corrections.
    pub fn record(&self, security_code: &str, value: Decimal, as_of: NaiveDate) -> Result<(), DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!(
                "Valuation must be positive, got {value}"
            )));
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO valuations (security_code, as_of, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(security_code, as_of) DO UPDATE SET value = excluded.value",
            params![security_code, date_text(as_of), value.normalize().to_string()],
        )
        .map_err(|e| DomainError::Database(format!("Failed to record valuation: {e}")))?;
        Ok(())
    }

    fn load_latest(&self, security_code: &str) -> Result<Option<Valuation>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.query_row(
            "SELECT security_code, value, as_of FROM valuations
             WHERE security_code = ?1
             ORDER BY as_of DESC LIMIT 1",
            params![security_code],
            |row| {
                Ok(Valuation {
                    security_code: row.get(0)?,
                    value: columns::decimal(row, 1)?,
                    as_of: columns::date(row, 2)?,
                })
            },
        )
        .optional()
        .map_err(|e| DomainError::Database(e.to_string()))
    }
}

#[async_trait]
impl ValuationReader for SqliteValuationReader {
    async fn latest_valuation(&self, security_code: &str) -> Option<Valuation> {
        match self.load_latest(security_code) {
            Ok(v) => v.filter(|v| v.value > Decimal::ZERO),
            Err(e) => {
                tracing::warn!(security = security_code, error = %e, "Valuation lookup failed");
                None
            }
        }
    }
}
