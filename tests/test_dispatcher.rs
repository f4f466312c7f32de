mod common;

use autoinvest::application::dispatcher::{ExecutionDispatcher, CANCELLED};
use autoinvest::application::handlers::HandlerRegistry;
use autoinvest::domain::entities::execution_log::ExecutionLogEntry;
use autoinvest::domain::entities::instruction::Instruction;
use autoinvest::domain::error::DomainError;
use autoinvest::domain::ports::execution_log_repository::ExecutionLogRepository;
use autoinvest::domain::ports::instruction_repository::InstructionRepository;
use autoinvest::domain::ports::ledger_repository::LedgerRepository;
use autoinvest::domain::values::execution_outcome::ExecutionOutcome;
use autoinvest::domain::values::transaction_kind::TransactionKind;
use autoinvest::infrastructure::sqlite::execution_log_repo::SqliteExecutionLogRepo;
use autoinvest::infrastructure::sqlite::instruction_repo::SqliteInstructionRepo;
use autoinvest::infrastructure::sqlite::ledger_repo::SqliteLedgerRepo;
use autoinvest::infrastructure::sqlite::notification_repo::SqliteNotificationSink;
use autoinvest::infrastructure::sqlite::valuation_repo::SqliteValuationReader;
use autoinvest::infrastructure::sqlite::{open_connection, SharedConnection};
use chrono::NaiveDate;
use common::{d, new_instruction, ACCOUNT, FUND};
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audit log whose first `failures` appends error out.
struct FlakyLog {
    inner: SqliteExecutionLogRepo,
    failures: AtomicUsize,
}

impl ExecutionLogRepository for FlakyLog {
    fn append(&self, entry: &ExecutionLogEntry) -> Result<i64, DomainError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(DomainError::Database("disk I/O error".into()));
        }
        self.inner.append(entry)
    }

    fn for_instruction(&self, instruction_id: i64) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.inner.for_instruction(instruction_id)
    }

    fn for_date(&self, execution_date: NaiveDate) -> Result<Vec<ExecutionLogEntry>, DomainError> {
        self.inner.for_date(execution_date)
    }
}

struct Harness {
    instructions: Arc<SqliteInstructionRepo>,
    ledger: Arc<SqliteLedgerRepo>,
    logs: Arc<dyn ExecutionLogRepository>,
    dispatcher: ExecutionDispatcher,
}

fn harness(log_failures: usize) -> Harness {
    let conn: SharedConnection = open_connection(":memory:", Duration::from_secs(5)).unwrap();
    let instructions = Arc::new(SqliteInstructionRepo::new(conn.clone()));
    let ledger = Arc::new(SqliteLedgerRepo::new(conn.clone()));
    let logs: Arc<dyn ExecutionLogRepository> = Arc::new(FlakyLog {
        inner: SqliteExecutionLogRepo::new(conn.clone()),
        failures: AtomicUsize::new(log_failures),
    });
    let valuations = Arc::new(SqliteValuationReader::new(conn.clone()));
    valuations.record(FUND, dec!(10), d("2024-01-01")).unwrap();
    ledger.credit(ACCOUNT, dec!(1000)).unwrap();

    let dispatcher = ExecutionDispatcher::new(
        instructions.clone(),
        ledger.clone(),
        logs.clone(),
        Arc::new(SqliteNotificationSink::new(conn)),
        HandlerRegistry::standard(ledger.clone(), valuations),
        Duration::from_secs(1),
    );
    Harness {
        instructions,
        ledger,
        logs,
        dispatcher,
    }
}

fn add_buy(h: &Harness) -> Instruction {
    let mut instruction = Instruction::new(
        new_instruction(TransactionKind::RecurringBuy, dec!(100), "2024-01-05"),
        d("2024-01-05"),
    )
    .unwrap();
    instruction.id = h.instructions.add(&instruction).unwrap();
    instruction
}

#[tokio::test]
async fn test_cancel_after_selection_is_reported_as_cancelled() {
    let h = harness(0);
    let snapshot = add_buy(&h);
    assert!(h.instructions.cancel(snapshot.id, "cancelled by operator").unwrap());

    let detail = h.dispatcher.dispatch(&snapshot, d("2024-01-05")).await;
    assert_eq!(detail.outcome, ExecutionOutcome::Skipped);
    assert_eq!(detail.reason.as_deref(), Some(CANCELLED));
    assert!(!detail.stopped);

    assert_eq!(h.ledger.balance(ACCOUNT).unwrap(), dec!(1000));
    let stored = h.instructions.get(snapshot.id).unwrap().unwrap();
    assert!(!stored.is_locked);
    assert_eq!(stored.stop_reason.as_deref(), Some("cancelled by operator"));

    let log = h.logs.for_instruction(snapshot.id).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].failure_reason.as_deref(), Some(CANCELLED));
}

#[tokio::test]
async fn test_audit_append_is_retried_once() {
    let h = harness(1);
    let instruction = add_buy(&h);

    let detail = h.dispatcher.dispatch(&instruction, d("2024-01-05")).await;
    assert_eq!(detail.outcome, ExecutionOutcome::Success);

    let log = h.logs.for_instruction(instruction.id).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].outcome, ExecutionOutcome::Success);
}

#[tokio::test]
async fn test_audit_append_gives_up_after_retry() {
    let h = harness(2);
    let instruction = add_buy(&h);

    let detail = h.dispatcher.dispatch(&instruction, d("2024-01-05")).await;
    assert_eq!(detail.outcome, ExecutionOutcome::Success);
    assert!(h.logs.for_instruction(instruction.id).unwrap().is_empty());
    assert_eq!(h.ledger.balance(ACCOUNT).unwrap(), dec!(900));
}
