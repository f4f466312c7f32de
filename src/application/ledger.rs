use crate::domain::entities::holding::Holding;
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_repository::LedgerRepository;
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct LedgerUseCase {
    repo: Arc<dyn LedgerRepository>,
}

impl LedgerUseCase {
    pub fn new(repo: Arc<dyn LedgerRepository>) -> Self {
        Self { repo }
    }

    pub fn deposit(&self, account_id: i64, amount: Decimal) -> Result<Decimal, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::InvalidInput(format!(
                "Deposit must be positive, got {amount}"
            )));
        }
        self.repo.credit(account_id, amount)
    }

    pub fn balance(&self, account_id: i64) -> Result<Decimal, DomainError> {
        self.repo.balance(account_id)
    }

    pub fn holdings(&self, account_id: i64) -> Result<Vec<Holding>, DomainError> {
        self.repo.holdings(account_id)
    }

    pub fn holding(&self, account_id: i64, security_code: &str) -> Result<Option<Holding>, DomainError> {
        self.repo.holding(account_id, security_code)
    }
}
