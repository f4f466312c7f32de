//! Per-kind execution handlers.
//!
//! A handler performs the economic side of one execution: it reads the
//! latest valuation and moves cash and units in the ledger. Scheduling
//! state, locking and auditing belong to the dispatcher.

pub mod purchase;
pub mod withdrawal;

use crate::domain::entities::instruction::Instruction;
use crate::domain::entities::valuation::Valuation;
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_repository::LedgerRepository;
use crate::domain::ports::valuation_reader::ValuationReader;
use crate::domain::values::transaction_kind::TransactionKind;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// What a successful execution moved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionEffect {
    pub units: Decimal,
    pub valuation: Decimal,
}

#[async_trait]
pub trait ExecutionHandler: Send + Sync {
    async fn execute(&self, instruction: &Instruction) -> Result<ExecutionEffect, DomainError>;
}

/// Maps transaction kinds to handlers. Kinds without a handler (recurring
/// transfers today) are reported as unsupported.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TransactionKind, Arc<dyn ExecutionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purchases for `recurring_buy` and `one_time`, redemptions for
    /// `recurring_withdraw`.
    pub fn standard(ledger: Arc<dyn LedgerRepository>, valuations: Arc<dyn ValuationReader>) -> Self {
        let purchase: Arc<dyn ExecutionHandler> =
            Arc::new(purchase::PurchaseHandler::new(ledger.clone(), valuations.clone()));
        let withdrawal: Arc<dyn ExecutionHandler> =
            Arc::new(withdrawal::WithdrawalHandler::new(ledger, valuations));
        Self::new()
            .register(TransactionKind::RecurringBuy, purchase.clone())
            .register(TransactionKind::OneTime, purchase)
            .register(TransactionKind::RecurringWithdraw, withdrawal)
    }

    pub fn register(mut self, kind: TransactionKind, handler: Arc<dyn ExecutionHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handler_for(&self, kind: TransactionKind) -> Result<Arc<dyn ExecutionHandler>, DomainError> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| DomainError::Unsupported(format!("{kind} instructions have no handler")))
    }
}

/// Latest valuation for the instruction's security, or `ValuationUnavailable`.
pub(crate) async fn require_valuation(
    valuations: &dyn ValuationReader,
    security_code: &str,
) -> Result<Valuation, DomainError> {
    valuations
        .latest_valuation(security_code)
        .await
        .filter(|v| v.value > Decimal::ZERO)
        .ok_or_else(|| DomainError::ValuationUnavailable(security_code.to_string()))
}

/// Units bought or redeemed for `amount` at `valuation`.
pub(crate) fn units_for(amount: Decimal, valuation: &Valuation) -> Result<Decimal, DomainError> {
    amount
        .checked_div(valuation.value)
        .ok_or_else(|| DomainError::ValuationUnavailable(valuation.security_code.clone()))
}
