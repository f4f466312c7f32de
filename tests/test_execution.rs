mod common;

use autoinvest::domain::values::execution_outcome::ExecutionOutcome;
use autoinvest::domain::values::lifecycle::{AttemptOutcome, LifecycleState};
use autoinvest::domain::values::transaction_kind::TransactionKind;
use common::{d, monthly, setup, ACCOUNT, FUND};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_withdrawal_redeems_at_average_cost() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(5000)).unwrap();
    ai.record_valuation(FUND, dec!(100), d("2024-01-01")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(5000), "2024-01-05");
    ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(0));

    ai.record_valuation(FUND, dec!(125), d("2024-01-31")).unwrap();
    let withdrawal = monthly(&ai, TransactionKind::RecurringWithdraw, dec!(1000), "2024-02-01");
    let summary = ai.run(Some(d("2024-02-01"))).await.unwrap();
    assert_eq!(summary.executed, 1);
    assert_eq!(summary.total_withdrawn, dec!(1000));
    assert_eq!(summary.total_invested, dec!(0));

    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(1000));
    let holding = ai.holding(ACCOUNT, FUND).unwrap().unwrap();
    assert_eq!(holding.units, dec!(42));
    assert_eq!(holding.invested, dec!(4200));
    assert_eq!(holding.last_valuation, Some(dec!(125)));

    let log = ai.history(withdrawal.id).unwrap();
    assert_eq!(log[0].units, Some(dec!(8)));
    assert_eq!(log[0].balance_after, Some(dec!(1000)));
}

#[tokio::test]
async fn test_full_redemption_removes_holding() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(1000), "2024-01-05");
    ai.run(Some(d("2024-01-05"))).await.unwrap();

    monthly(&ai, TransactionKind::RecurringWithdraw, dec!(1000), "2024-01-06");
    let summary = ai.run(Some(d("2024-01-06"))).await.unwrap();
    assert_eq!(summary.executed, 1);
    assert!(ai.holding(ACCOUNT, FUND).unwrap().is_none());
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(1000));
}

#[tokio::test]
async fn test_insufficient_balance_is_retried() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(100), d("2024-01-01")).unwrap();
    let instruction = monthly(&ai, TransactionKind::RecurringBuy, dec!(5000), "2024-01-15");

    let summary = ai.run(Some(d("2024-01-15"))).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.executed, 0);

    let failed = ai.get_instruction(instruction.id).unwrap();
    assert_eq!(failed.lifecycle, LifecycleState::Pending);
    assert_eq!(failed.last_outcome, Some(AttemptOutcome::Failed));
    assert_eq!(failed.next_execution_date, Some(d("2024-01-15")));
    assert_eq!(failed.execution_count, 0);
    assert!(failed.failure_reason.unwrap().contains("Insufficient balance"));
    assert!(!failed.is_locked);
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(1000));
    assert!(ai.holding(ACCOUNT, FUND).unwrap().is_none());

    // Re-running the same date re-attempts exactly once.
    let retry = ai.run(Some(d("2024-01-15"))).await.unwrap();
    assert_eq!(retry.total_due, 1);
    assert_eq!(retry.failed, 1);

    ai.deposit(ACCOUNT, dec!(4000)).unwrap();
    let recovered = ai.run(Some(d("2024-01-16"))).await.unwrap();
    assert_eq!(recovered.executed, 1);

    let done = ai.get_instruction(instruction.id).unwrap();
    assert_eq!(done.lifecycle, LifecycleState::Active);
    assert_eq!(done.failure_reason, None);
    assert_eq!(done.next_execution_date, Some(d("2024-02-16")));
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(0));

    let outcomes: Vec<_> = ai
        .history(instruction.id)
        .unwrap()
        .into_iter()
        .map(|e| e.outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![ExecutionOutcome::Failed, ExecutionOutcome::Failed, ExecutionOutcome::Success]
    );
}

#[tokio::test]
async fn test_insufficient_units_leaves_ledger_untouched() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(300)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");
    ai.run(Some(d("2024-01-05"))).await.unwrap();

    let withdrawal = monthly(&ai, TransactionKind::RecurringWithdraw, dec!(500), "2024-01-10");
    let summary = ai.run(Some(d("2024-01-10"))).await.unwrap();
    assert_eq!(summary.failed, 1);

    let failed = ai.get_instruction(withdrawal.id).unwrap();
    assert!(failed.failure_reason.unwrap().contains("Insufficient units"));
    assert_eq!(ai.holding(ACCOUNT, FUND).unwrap().unwrap().units, dec!(10));
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(200));
}

#[tokio::test]
async fn test_missing_valuation_fails_without_side_effects() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    let instruction = monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    let summary = ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(summary.failed, 1);
    let detail = &summary.details[0];
    assert_eq!(detail.outcome, ExecutionOutcome::Failed);
    assert!(detail.reason.as_deref().unwrap().contains("No valuation available for FUND-A"));

    let failed = ai.get_instruction(instruction.id).unwrap();
    assert_eq!(failed.lifecycle, LifecycleState::Pending);
    assert_eq!(failed.next_execution_date, Some(d("2024-01-05")));
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(1000));

    ai.record_valuation(FUND, dec!(10), d("2024-01-05")).unwrap();
    let retry = ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(retry.executed, 1);
}

#[tokio::test]
async fn test_latest_valuation_is_used() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    ai.record_valuation(FUND, dec!(20), d("2024-01-04")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(ai.holding(ACCOUNT, FUND).unwrap().unwrap().units, dec!(5));
}

#[tokio::test]
async fn test_transfer_is_unsupported_and_batch_continues() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    let transfer = monthly(&ai, TransactionKind::RecurringTransfer, dec!(100), "2024-01-05");
    let buy = monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    let summary = ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(summary.total_due, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.executed, 1);

    let failed = ai.get_instruction(transfer.id).unwrap();
    assert!(failed.failure_reason.unwrap().contains("Not supported"));
    assert_eq!(failed.lifecycle, LifecycleState::Pending);

    assert_eq!(ai.get_instruction(buy.id).unwrap().execution_count, 1);
    assert_eq!(ai.balance(ACCOUNT).unwrap(), dec!(900));
}

#[tokio::test]
async fn test_accounts_are_isolated() {
    let ai = setup();
    ai.deposit(ACCOUNT, dec!(1000)).unwrap();
    ai.deposit(99, dec!(50)).unwrap();
    ai.record_valuation(FUND, dec!(10), d("2024-01-01")).unwrap();
    monthly(&ai, TransactionKind::RecurringBuy, dec!(100), "2024-01-05");

    ai.run(Some(d("2024-01-05"))).await.unwrap();
    assert_eq!(ai.balance(99).unwrap(), dec!(50));
    assert!(ai.holdings(99).unwrap().is_empty());
    assert_eq!(ai.holdings(ACCOUNT).unwrap().len(), 1);
}
