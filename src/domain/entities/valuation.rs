use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price per unit of a security as of a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub security_code: String,
    pub value: Decimal,
    pub as_of: NaiveDate,
}
