use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    RecurringBuy,
    RecurringWithdraw,
    RecurringTransfer,
    /// Single purchase executed once on its due date.
    OneTime,
}

impl TransactionKind {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, TransactionKind::OneTime)
    }

    /// Kinds whose successful execution debits cash into a holding.
    pub fn is_purchase(&self) -> bool {
        matches!(self, TransactionKind::RecurringBuy | TransactionKind::OneTime)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::RecurringBuy => write!(f, "recurring_buy"),
            TransactionKind::RecurringWithdraw => write!(f, "recurring_withdraw"),
            TransactionKind::RecurringTransfer => write!(f, "recurring_transfer"),
            TransactionKind::OneTime => write!(f, "one_time"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recurring_buy" => Ok(TransactionKind::RecurringBuy),
            "recurring_withdraw" => Ok(TransactionKind::RecurringWithdraw),
            "recurring_transfer" => Ok(TransactionKind::RecurringTransfer),
            "one_time" => Ok(TransactionKind::OneTime),
            _ => Err(format!("Unknown transaction kind: {s}")),
        }
    }
}
