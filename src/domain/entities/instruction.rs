use crate::domain::error::DomainError;
use crate::domain::values::frequency::Frequency;
use crate::domain::values::lifecycle::{AttemptOutcome, LifecycleState};
use crate::domain::values::transaction_kind::TransactionKind;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A persisted recurring or one-time transaction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: i64,
    pub account_id: i64,
    pub security_code: String,
    pub security_name: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    /// Units transacted by the most recent successful execution.
    pub units: Option<Decimal>,
    /// Valuation used by the most recent successful execution.
    pub valuation: Option<Decimal>,
    pub frequency: Option<Frequency>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub installment_cap: Option<u32>,
    pub lifecycle: LifecycleState,
    pub last_outcome: Option<AttemptOutcome>,
    pub next_execution_date: Option<NaiveDate>,
    pub last_execution_date: Option<NaiveDate>,
    pub execution_count: u32,
    pub failure_reason: Option<String>,
    /// Why the instruction was cancelled, when it was.
    pub stop_reason: Option<String>,
    pub is_locked: bool,
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Intake payload for a new instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInstruction {
    pub account_id: i64,
    pub security_code: String,
    #[serde(default)]
    pub security_name: Option<String>,
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub installment_cap: Option<u32>,
}

impl Instruction {
    /// Builds an unsaved instruction (id 0). The first occurrence is due on
    /// `start_date`; a start on or before `today` is immediately active.
    pub fn new(new: NewInstruction, today: NaiveDate) -> Result<Self, DomainError> {
        if new.amount <= Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!(
                "Amount must be positive, got {}",
                new.amount
            )));
        }
        if new.security_code.trim().is_empty() {
            return Err("Security code is required".into());
        }
        if new.kind.is_recurring() && new.frequency.is_none() {
            return Err(DomainError::InvalidInput(format!(
                "Frequency is required for {} instructions",
                new.kind
            )));
        }
        if let Some(end) = new.end_date {
            if end < new.start_date {
                return Err(DomainError::InvalidInput(format!(
                    "End date {end} is before start date {}",
                    new.start_date
                )));
            }
        }
        if new.installment_cap == Some(0) {
            return Err("Installment cap must be at least 1".into());
        }

        let lifecycle = if new.start_date <= today {
            LifecycleState::Active
        } else {
            LifecycleState::Pending
        };
        let now = Utc::now();
        let security_name = new
            .security_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| new.security_code.clone());
        let frequency = if new.kind.is_recurring() { new.frequency } else { None };

        Ok(Self {
            id: 0,
            account_id: new.account_id,
            security_code: new.security_code,
            security_name,
            kind: new.kind,
            amount: new.amount,
            units: None,
            valuation: None,
            frequency,
            start_date: new.start_date,
            end_date: new.end_date,
            installment_cap: new.installment_cap,
            lifecycle,
            last_outcome: None,
            next_execution_date: Some(new.start_date),
            last_execution_date: None,
            execution_count: 0,
            failure_reason: None,
            stop_reason: None,
            is_locked: false,
            locked_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}
