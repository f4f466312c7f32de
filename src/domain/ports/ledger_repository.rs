use crate::domain::entities::holding::Holding;
use crate::domain::error::DomainError;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A unit movement against a holding at a known valuation.
#[derive(Debug, Clone)]
pub struct HoldingChange<'a> {
    pub account_id: i64,
    pub security_code: &'a str,
    pub security_name: &'a str,
    pub units: Decimal,
    pub valuation: Decimal,
    pub valuation_date: NaiveDate,
}

/// Cash balances and holdings. Every method is atomic on its own row; there
/// is no cross-entity transaction.
pub trait LedgerRepository: Send + Sync {
    /// Balance of an account; unknown accounts hold zero.
    fn balance(&self, account_id: i64) -> Result<Decimal, DomainError>;

    /// Adds `amount` and returns the new balance.
    fn credit(&self, account_id: i64, amount: Decimal) -> Result<Decimal, DomainError>;

    /// Subtracts `amount` if the balance covers it and returns the new
    /// balance; otherwise fails with `InsufficientBalance` and changes nothing.
    fn debit(&self, account_id: i64, amount: Decimal) -> Result<Decimal, DomainError>;

    fn holding(&self, account_id: i64, security_code: &str) -> Result<Option<Holding>, DomainError>;
    fn holdings(&self, account_id: i64) -> Result<Vec<Holding>, DomainError>;

    /// Creates or grows a holding by `change.units` with `cost` added to the
    /// invested basis.
    fn add_units(&self, change: &HoldingChange<'_>, cost: Decimal) -> Result<Holding, DomainError>;

    /// Shrinks a holding by `change.units`, reducing the invested basis at
    /// the cost per unit held before the change. Deletes the holding when no
    /// units remain. Returns the cost basis removed.
    fn remove_units(&self, change: &HoldingChange<'_>) -> Result<Decimal, DomainError>;
}
