//! Shared test helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use autoinvest::config::SchedulerConfig;
use autoinvest::domain::entities::instruction::{Instruction, NewInstruction};
use autoinvest::domain::entities::notification::NotificationRequest;
use autoinvest::domain::error::DomainError;
use autoinvest::domain::ports::notification_emitter::NotificationEmitter;
use autoinvest::domain::values::frequency::Frequency;
use autoinvest::domain::values::transaction_kind::TransactionKind;
use autoinvest::AutoInvest;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Mutex;

pub const ACCOUNT: i64 = 7;
pub const FUND: &str = "FUND-A";

pub fn setup() -> AutoInvest {
    AutoInvest::new(":memory:").unwrap()
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn new_instruction(kind: TransactionKind, amount: Decimal, start: &str) -> NewInstruction {
    NewInstruction {
        account_id: ACCOUNT,
        security_code: FUND.into(),
        security_name: Some("Fund A".into()),
        kind,
        amount,
        frequency: kind.is_recurring().then_some(Frequency::Monthly),
        start_date: d(start),
        end_date: None,
        installment_cap: None,
    }
}

/// Creates a monthly instruction as of its own start date.
pub fn monthly(ai: &AutoInvest, kind: TransactionKind, amount: Decimal, start: &str) -> Instruction {
    ai.create_instruction_on(new_instruction(kind, amount, start), d(start))
        .unwrap()
}

pub fn config_for(db_path: &str) -> SchedulerConfig {
    SchedulerConfig::default().with_db_path(db_path)
}

/// Emitter that always fails, to prove notifications are best-effort.
pub struct FailingEmitter;

#[async_trait]
impl NotificationEmitter for FailingEmitter {
    async fn emit(&self, _request: &NotificationRequest) -> Result<(), DomainError> {
        Err(DomainError::Notification("gateway unavailable".into()))
    }
}

/// Emitter that never answers within any reasonable timeout.
pub struct HangingEmitter;

#[async_trait]
impl NotificationEmitter for HangingEmitter {
    async fn emit(&self, _request: &NotificationRequest) -> Result<(), DomainError> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(())
    }
}

/// Records every request it receives.
#[derive(Default)]
pub struct RecordingEmitter {
    pub sent: Mutex<Vec<NotificationRequest>>,
}

#[async_trait]
impl NotificationEmitter for RecordingEmitter {
    async fn emit(&self, request: &NotificationRequest) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(())
    }
}
