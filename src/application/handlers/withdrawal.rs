use super::{require_valuation, units_for, ExecutionEffect, ExecutionHandler};
use crate::domain::entities::instruction::Instruction;
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_repository::{HoldingChange, LedgerRepository};
use crate::domain::ports::valuation_reader::ValuationReader;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;

/// Redeems units at the latest valuation and credits the proceeds.
pub struct WithdrawalHandler {
    ledger: Arc<dyn LedgerRepository>,
    valuations: Arc<dyn ValuationReader>,
}

impl WithdrawalHandler {
    pub fn new(ledger: Arc<dyn LedgerRepository>, valuations: Arc<dyn ValuationReader>) -> Self {
        Self { ledger, valuations }
    }
}

#[async_trait]
impl ExecutionHandler for WithdrawalHandler {
    async fn execute(&self, instruction: &Instruction) -> Result<ExecutionEffect, DomainError> {
        let valuation = require_valuation(self.valuations.as_ref(), &instruction.security_code).await?;
        let units = units_for(instruction.amount, &valuation)?;

        let change = HoldingChange {
            account_id: instruction.account_id,
            security_code: &instruction.security_code,
            security_name: &instruction.security_name,
            units,
            valuation: valuation.value,
            valuation_date: valuation.as_of,
        };
        // Fails with InsufficientUnits without touching the holding.
        let cost_removed = self.ledger.remove_units(&change)?;

        if let Err(e) = self.ledger.credit(instruction.account_id, instruction.amount) {
            if let Err(restore) = self.ledger.add_units(&change, cost_removed) {
                error!(
                    instruction_id = instruction.id,
                    account_id = instruction.account_id,
                    units = %units,
                    error = %restore,
                    "Restoring units after failed credit also failed; ledger needs manual repair"
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
