use super::{require_valuation, units_for, ExecutionEffect, ExecutionHandler};
use crate::domain::entities::instruction::Instruction;
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_repository::{HoldingChange, LedgerRepository};
use crate::domain::ports::valuation_reader::ValuationReader;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

/// Debits cash and adds units at the latest valuation.
pub struct PurchaseHandler {
    ledger: Arc<dyn LedgerRepository>,
    valuations: Arc<dyn ValuationReader>,
}

impl PurchaseHandler {
    pub fn new(ledger: Arc<dyn LedgerRepository>, valuations: Arc<dyn ValuationReader>) -> Self {
        Self { ledger, valuations }
    }
}

#[async_trait]
impl ExecutionHandler for PurchaseHandler {
    async fn execute(&self, instruction: &Instruction) -> Result<ExecutionEffect, DomainError> {
        let valuation = require_valuation(self.valuations.as_ref(), &instruction.security_code).await?;
        let units = units_for(instruction.amount, &valuation)?;

        // Fails with InsufficientBalance without touching the account.
        self.ledger.debit(instruction.account_id, instruction.amount)?;

        let change = HoldingChange {
            account_id: instruction.account_id,
            security_code: &instruction.security_code,
            security_name: &instruction.security_name,
            units,
            valuation: valuation.value,
            valuation_date: valuation.as_of,
        };
        if let Err(e) = self.ledger.add_units(&change, instruction.amount) {
            if let Err(refund) = self.ledger.credit(instruction.account_id, instruction.amount) {
                error!(
                    instruction_id = instruction.id,
                    account_id = instruction.account_id,
                    amount = %instruction.amount,
                    error = %refund,
                    "Refund after failed holding update also failed; ledger needs manual repair"
                );
            }
            return Err(e);
        }

        Ok(ExecutionEffect {
            units,
            valuation: valuation.value,
        })
    }
}
