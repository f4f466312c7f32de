use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate position of an account in one security.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub account_id: i64,
    pub security_code: String,
    pub security_name: String,
    pub units: Decimal,
    pub invested: Decimal,
    pub last_valuation: Option<Decimal>,
    pub last_valuation_date: Option<NaiveDate>,
}

impl Holding {
    pub fn cost_per_unit(&self) -> Decimal {
        if self.units.is_zero() {
            Decimal::ZERO
        } else {
            self.invested / self.units
        }
    }
}
