mod common;

use autoinvest::domain::ports::notification_emitter::NotificationEmitter;
use autoinvest::domain::values::execution_outcome::ExecutionOutcome;
use autoinvest::domain::values::severity::Severity;
use autoinvest::domain::values::transaction_kind::TransactionKind;
use autoinvest::AutoInvest;
use common::{
    config_for, d, monthly, new_instruction, setup, FailingEmitter, HangingEmitter, RecordingEmitter, ACCOUNT,
    FUND,
};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn with_emitter(emitter: Arc<dyn NotificationEmitter>, timeout: Duration) -> AutoInvest {
    let mut config = config_for(":memory:");
    config.notification_timeout = timeout;
    AutoInvest::with_providers(&config, None, Some(emitter)).unwrap()
}

#[tokio::test]
async fn test_success_and_failure_land_in_outbox() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(150)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");
    monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    ai.run(Some(d("2024-01-05"))).await.unwrap();

    let notifications = ai.notifications(ACCOUNT).unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].request.severity, Severity::Success);
    assert_eq!(notifications[0].request.title, "Scheduled transaction executed");
    assert!(notifications[0].request.message.starts_with("Bought "));
    assert_eq!(notifications[1].request.severity, Severity::Error);
    assert!(notifications[1].request.message.contains("Insufficient balance"));
    assert!(ai.notifications(99).unwrap().is_empty());
}

#[tokio::test]
async fn test_stop_sends_ended_notification() {
    let emitter = Arc::new(RecordingEmitter::default());
    let ai = with_emitter(emitter.clone(), Duration::from_secs(1));
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    let mut new = new_instruction(TransactionKind::RecurringBuy, dec!(100), "2024-01-05");
    new.end_date = Some(d("2024-01-20"));
    ai.create_instruction_on(new, d("2024-01-05")).unwrap();

    ai.run(Some(d("2024-01-05"))).await.unwrap();
    ai.run(Some(d("2024-02-05"))).await.unwrap();

    let sent = emitter.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].title, "Scheduled transaction ended");
    assert_eq!(sent[1].severity, Severity::Info);
    assert!(sent[1].message.contains("End date 2024-01-20 has passed"));
}

#[tokio::test]
async fn test_failing_emitter_does_not_affect_execution() {
    let ai = with_emitter(Arc::new(FailingEmitter), Duration::from_secs(1));
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    let instruction = monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    let summary = ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(summary.executed, 1);
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(900));
    assert_eq!(ai.history(instruction.id).unwrap()[0].outcome, ExecutionOutcome::Success);
    assert!(ai.notifications(ACCOUNT).unwrap().is_empty());
}

#[tokio::test]
async fn test_hanging_emitter_times_out() {
    let ai = with_emitter(Arc::new(HangingEmitter), Duration::from_millis(20));
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    let started = Instant::now();
    let summary = ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(summary.executed, 1);
}
