pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

use crate::application::dispatcher::{DispatchDetail, ExecutionDispatcher};
use crate::application::handlers::HandlerRegistry;
use crate::application::history::HistoryUseCase;
use crate::application::instructions::InstructionUseCase;
use crate::application::ledger::LedgerUseCase;
use crate::application::run_batch::{RunBatchUseCase, RunSummary};
use crate::config::SchedulerConfig;
use crate::domain::entities::execution_log::ExecutionLogEntry;
use crate::domain::entities::holding::Holding;
use crate::domain::entities::instruction::{Instruction, NewInstruction};
use crate::domain::entities::notification::Notification;
use crate::domain::error::DomainError;
use crate::domain::ports::execution_log_repository::ExecutionLogRepository;
use crate::domain::ports::instruction_repository::{InstructionFilter, InstructionRepository};
use crate::domain::ports::ledger_repository::LedgerRepository;
use crate::domain::ports::notification_emitter::NotificationEmitter;
use crate::domain::ports::valuation_reader::ValuationReader;
use crate::infrastructure::sqlite::execution_log_repo::SqliteExecutionLogRepo;
use crate::infrastructure::sqlite::instruction_repo::SqliteInstructionRepo;
use crate::infrastructure::sqlite::ledger_repo::SqliteLedgerRepo;
use crate::infrastructure::sqlite::notification_repo::SqliteNotificationSink;
use crate::infrastructure::sqlite::open_connection;
use crate::infrastructure::sqlite::valuation_repo::SqliteValuationReader;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct AutoInvest {
    run_uc: RunBatchUseCase,
    instruction_uc: InstructionUseCase,
    ledger_uc: LedgerUseCase,
    history_uc: HistoryUseCase,
    valuation_store: Arc<SqliteValuationReader>,
    notification_outbox: Arc<SqliteNotificationSink>,
}

impl AutoInvest {
    /// Opens `db_path` with the SQLite valuation reader and notification
    /// outbox.
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        Self::with_config(&SchedulerConfig::default().with_db_path(db_path))
    }

    pub fn with_config(config: &SchedulerConfig) -> Result<Self, DomainError> {
        Self::with_providers(config, None, None)
    }

    /// Overrides the external collaborators; `None` keeps the SQLite ones.
    pub fn with_providers(
        config: &SchedulerConfig,
        valuations: Option<Arc<dyn ValuationReader>>,
        notifier: Option<Arc<dyn NotificationEmitter>>,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        let conn = open_connection(&config.db_path, config.busy_timeout)?;

        let instruction_repo: Arc<dyn InstructionRepository> =
            Arc::new(SqliteInstructionRepo::new(conn.clone()));
        let ledger_repo: Arc<dyn LedgerRepository> = Arc::new(SqliteLedgerRepo::new(conn.clone()));
        let log_repo: Arc<dyn ExecutionLogRepository> =
            Arc::new(SqliteExecutionLogRepo::new(conn.clone()));
        let valuation_store = Arc::new(SqliteValuationReader::new(conn.clone()));
        let notification_outbox = Arc::new(SqliteNotificationSink::new(conn));

        let valuations: Arc<dyn ValuationReader> =
            valuations.unwrap_or_else(|| valuation_store.clone() as Arc<dyn ValuationReader>);
        let notifier: Arc<dyn NotificationEmitter> =
            notifier.unwrap_or_else(|| notification_outbox.clone() as Arc<dyn NotificationEmitter>);

        let stale_lock_threshold = chrono::Duration::from_std(config.stale_lock_threshold)
            .map_err(|e| DomainError::InvalidInput(format!("Stale lock threshold out of range: {e}")))?;

        let dispatcher = Arc::new(ExecutionDispatcher::new(
            instruction_repo.clone(),
            ledger_repo.clone(),
            log_repo.clone(),
            notifier,
            HandlerRegistry::standard(ledger_repo.clone(), valuations),
            config.notification_timeout,
        ));

        Ok(Self {
            run_uc: RunBatchUseCase::new(instruction_repo.clone(), dispatcher, stale_lock_threshold),
            instruction_uc: InstructionUseCase::new(instruction_repo),
            ledger_uc: LedgerUseCase::new(ledger_repo),
            history_uc: HistoryUseCase::new(log_repo),
            valuation_store,
            notification_outbox,
        })
    }

    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // Scheduler
    pub async fn run(&self, target: Option<NaiveDate>) -> Result<RunSummary, DomainError> {
        self.run_uc.execute(target.unwrap_or_else(Self::today)).await
    }

    pub fn due(&self, target: Option<NaiveDate>) -> Result<Vec<Instruction>, DomainError> {
        self.run_uc.due(target.unwrap_or_else(Self::today))
    }

    pub async fn execute_instruction(
        &self,
        id: i64,
        target: Option<NaiveDate>,
    ) -> Result<DispatchDetail, DomainError> {
        self.run_uc.execute_one(id, target.unwrap_or_else(Self::today)).await
    }

    pub fn release_stale_locks(&self) -> Result<usize, DomainError> {
        self.run_uc.release_stale_locks()
    }

    pub fn force_unlock(&self, id: i64) -> Result<(), DomainError> {
        self.instruction_uc.force_unlock(id)
    }

    // Instructions
    pub fn create_instruction(&self, new: NewInstruction) -> Result<Instruction, DomainError> {
        self.instruction_uc.create(new, Self::today())
    }

    pub fn create_instruction_on(
        &self,
        new: NewInstruction,
        today: NaiveDate,
    ) -> Result<Instruction, DomainError> {
        self.instruction_uc.create(new, today)
    }

    pub fn get_instruction(&self, id: i64) -> Result<Instruction, DomainError> {
        self.instruction_uc.get(id)
    }

    pub fn list_instructions(&self, filter: &InstructionFilter) -> Result<Vec<Instruction>, DomainError> {
        self.instruction_uc.list(filter)
    }

    pub fn cancel_instruction(&self, id: i64) -> Result<Instruction, DomainError> {
        self.instruction_uc.cancel(id)
    }

    // Ledger
    pub fn deposit(&self, account_id: i64, amount: Decimal) -> Result<Decimal, DomainError> {
        self.ledger_uc.deposit(account_id, amount)
    }

    pub fn balance(&self, account_id: i64) -> Result<Decimal, DomainError> {
        self.ledger_uc.balance(account_id)
    }

    pub fn holdings(&self, account_id: i64) -> Result<Vec<Holding>, DomainError> {
        self.ledger_uc.holdings(account_id)
    }

    pub fn holding(&self, account_id: i64, security_code: &str) -> Result<Option<Holding>, DomainError> {
        self.ledger_uc.holding(account_id, security_code)
    }

    pub fn record_valuation(
        &self,
        security_code: &str,
        value: Decimal,
        as_of: NaiveDate,
    ) -> Result<(), DomainError> {
        self.valuation_store.record(security_code, value, as_of)
    }

    // Audit
    pub fn history(&self, instruction_id: i64) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.history_uc.for_instruction(instruction_id)
    }

    pub fn history_for_date(&self, execution_date: NaiveDate) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.history_uc.for_date(execution_date)
    }

    pub fn notifications(&self, account_id: i64) -> Result<Vec<Notification>, DomainError> {
        self.notification_outbox.list(account_id)
    }
}
