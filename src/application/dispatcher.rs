use crate::application::handlers::{ExecutionEffect, HandlerRegistry};
use crate::domain::entities::execution_log::ExecutionLogEntry;
use crate::domain::entities::instruction::Instruction;
use crate::domain::entities::notification::NotificationRequest;
use crate::domain::error::DomainError;
use crate::domain::ports::execution_log_repository::ExecutionLogRepository;
use crate::domain::ports::instruction_repository::{ExecutionSuccess, InstructionRepository};
use crate::domain::ports::ledger_repository::LedgerRepository;
use crate::domain::ports::notification_emitter::NotificationEmitter;
use crate::domain::values::execution_outcome::ExecutionOutcome;
use crate::domain::values::severity::Severity;
use crate::domain::values::stop_condition::should_stop;
use crate::domain::values::transaction_kind::TransactionKind;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const ALREADY_LOCKED: &str = "already locked";
pub const CANCELLED: &str = "instruction is cancelled";

/// Outcome of one dispatch attempt, mirrored into the audit log.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchDetail {
    pub instruction_id: i64,
    pub account_id: i64,
    pub security_code: String,
    pub kind: TransactionKind,
    pub execution_date: NaiveDate,
    pub outcome: ExecutionOutcome,
    pub amount: Decimal,
    pub units: Option<Decimal>,
    pub valuation: Option<Decimal>,
    pub balance_before: Option<Decimal>,
    pub balance_after: Option<Decimal>,
    pub next_execution_date: Option<NaiveDate>,
    pub reason: Option<String>,
    /// Set when a stop condition cancelled the instruction.
    pub stopped: bool,
    pub duration_ms: i64,
}

impl DispatchDetail {
    fn new(instruction: &Instruction, execution_date: NaiveDate, outcome: ExecutionOutcome) -> Self {
        Self {
            instruction_id: instruction.id,
            account_id: instruction.account_id,
            security_code: instruction.security_code.clone(),
            kind: instruction.kind,
            execution_date,
            outcome,
            amount: instruction.amount,
            units: None,
            valuation: None,
            balance_before: None,
            balance_after: None,
            next_execution_date: instruction.next_execution_date,
            reason: None,
            stopped: false,
            duration_ms: 0,
        }
    }

    fn skipped(instruction: &Instruction, execution_date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(instruction, execution_date, ExecutionOutcome::Skipped)
        }
    }

    fn failed(instruction: &Instruction, execution_date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::new(instruction, execution_date, ExecutionOutcome::Failed)
        }
    }

    fn to_log_entry(&self) -> ExecutionLogEntry {
        ExecutionLogEntry {
            id: 0,
            instruction_id: self.instruction_id,
            account_id: self.account_id,
            execution_date: self.execution_date,
            outcome: self.outcome,
            amount: self.amount,
            units: self.units,
            valuation: self.valuation,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            failure_reason: self.reason.clone(),
            duration_ms: self.duration_ms,
            created_at: Utc::now(),
        }
    }
}

/// Runs a single instruction through lock, stop gate, execution, unlock,
/// audit and notification. Never returns an error: every failure becomes a
/// `DispatchDetail` so one instruction cannot abort a batch.
pub struct ExecutionDispatcher {
    instructions: Arc<dyn InstructionRepository>,
    ledger: Arc<dyn LedgerRepository>,
    logs: Arc<dyn ExecutionLogRepository>,
    notifier: Arc<dyn NotificationEmitter>,
    handlers: HandlerRegistry,
    notification_timeout: Duration,
}

impl ExecutionDispatcher {
    pub fn new(
        instructions: Arc<dyn InstructionRepository>,
        ledger: Arc<dyn LedgerRepository>,
        logs: Arc<dyn ExecutionLogRepository>,
        notifier: Arc<dyn NotificationEmitter>,
        handlers: HandlerRegistry,
        notification_timeout: Duration,
    ) -> Self {
        Self {
            instructions,
            ledger,
            logs,
            notifier,
            handlers,
            notification_timeout,
        }
    }

    pub async fn dispatch(&self, instruction: &Instruction, target: NaiveDate) -> DispatchDetail {
        let started = Instant::now();

        let mut detail = if !instruction.lifecycle.is_schedulable() {
            DispatchDetail::skipped(instruction, target, CANCELLED)
        } else {
            match self.instructions.try_lock(instruction.id, Utc::now()) {
                Ok(true) => {
                    let detail = self.execute_locked(instruction, target).await;
                    self.release(instruction.id);
                    detail
                }
                Ok(false) => {
                    debug!(instruction_id = instruction.id, "Lock held elsewhere, skipping");
                    DispatchDetail::skipped(instruction, target, ALREADY_LOCKED)
                }
                Err(e) => {
                    error!(instruction_id = instruction.id, error = %e, "Lock acquisition failed");
                    DispatchDetail::failed(instruction, target, format!("Lock acquisition failed: {e}"))
                }
            }
        };

        detail.duration_ms = started.elapsed().as_millis() as i64;
        self.record(&detail);
        self.notify(instruction, &detail).await;
        detail
    }

    /// Body of a dispatch while the lock is held.
    async fn execute_locked(&self, snapshot: &Instruction, target: NaiveDate) -> DispatchDetail {
        // The selection snapshot may predate another run's execution.
        let instruction = match self.instructions.get(snapshot.id) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => {
                let reason = format!("Instruction not found: {}", snapshot.id);
                return DispatchDetail::failed(snapshot, target, reason);
            }
            Err(e) => return DispatchDetail::failed(snapshot, target, e.to_string()),
        };

        // Cancelled by an operator after this run selected it.
        if !instruction.lifecycle.is_schedulable() {
            return DispatchDetail::skipped(&instruction, target, CANCELLED);
        }

        let decision = should_stop(&instruction, target);
        if decision.stop {
            let reason = decision.reason.unwrap_or_else(|| "stop condition reached".into());
            info!(instruction_id = instruction.id, reason = %reason, "Stop condition reached, cancelling");
            return match self.instructions.cancel(instruction.id, &reason) {
                Ok(_) => DispatchDetail {
                    next_execution_date: None,
                    stopped: true,
                    ..DispatchDetail::skipped(&instruction, target, reason)
                },
                Err(e) => DispatchDetail::failed(&instruction, target, format!("Failed to cancel: {e}")),
            };
        }

        if let Some(last) = instruction.last_execution_date.filter(|d| *d >= target) {
            return DispatchDetail::skipped(&instruction, target, format!("already executed for {last}"));
        }
        if !instruction.next_execution_date.is_some_and(|d| d <= target) {
            return DispatchDetail::skipped(&instruction, target, format!("not due on {target}"));
        }

        let balance_before = match self.ledger.balance(instruction.account_id) {
            Ok(b) => b,
            Err(e) => return self.fail(&instruction, target, None, e),
        };

        let next_execution_date = match self.next_execution_date(&instruction, target) {
            Ok(next) => next,
            Err(e) => return self.fail(&instruction, target, Some(balance_before), e),
        };

        let effect = match self.handlers.handler_for(instruction.kind) {
            Ok(handler) => handler.execute(&instruction).await,
            Err(e) => Err(e),
        };
        match effect {
            Ok(effect) => self.succeed(&instruction, target, balance_before, next_execution_date, effect),
            Err(e) => self.fail(&instruction, target, Some(balance_before), e),
        }
    }

    fn next_execution_date(
        &self,
        instruction: &Instruction,
        target: NaiveDate,
    ) -> Result<Option<NaiveDate>, DomainError> {
        if !instruction.kind.is_recurring() {
            return Ok(None);
        }
        let frequency = instruction.frequency.ok_or_else(|| {
            DomainError::Unsupported(format!(
                "{} instruction {} has no frequency",
                instruction.kind, instruction.id
            ))
        })?;
        frequency.next_date(target).map(Some)
    }

    fn succeed(
        &self,
        instruction: &Instruction,
        target: NaiveDate,
        balance_before: Decimal,
        next_execution_date: Option<NaiveDate>,
        effect: ExecutionEffect,
    ) -> DispatchDetail {
        let update = ExecutionSuccess {
            execution_date: target,
            next_execution_date,
            units: effect.units,
            valuation: effect.valuation,
        };
        let mut reason = None;
        if let Err(e) = self.instructions.record_success(instruction.id, &update) {
            error!(
                instruction_id = instruction.id,
                error = %e,
                "Ledger updated but schedule could not be advanced"
            );
            reason = Some(format!("Schedule update failed: {e}"));
        }
        let balance_after = self.ledger.balance(instruction.account_id).ok();

        info!(
            instruction_id = instruction.id,
            kind = %instruction.kind,
            amount = %instruction.amount,
            units = %effect.units,
            next = ?next_execution_date,
            "Instruction executed"
        );
        DispatchDetail {
            units: Some(effect.units),
            valuation: Some(effect.valuation),
            balance_before: Some(balance_before),
            balance_after,
            next_execution_date,
            reason,
            ..DispatchDetail::new(instruction, target, ExecutionOutcome::Success)
        }
    }

    fn fail(
        &self,
        instruction: &Instruction,
        target: NaiveDate,
        balance_before: Option<Decimal>,
        err: DomainError,
    ) -> DispatchDetail {
        let reason = err.to_string();
        if err.is_retryable() {
            warn!(instruction_id = instruction.id, reason = %reason, "Execution failed, will retry next run");
        } else {
            error!(instruction_id = instruction.id, reason = %reason, "Execution failed");
        }
        if let Err(e) = self.instructions.record_failure(instruction.id, &reason) {
            error!(instruction_id = instruction.id, error = %e, "Failed to record execution failure");
        }
        DispatchDetail {
            balance_before,
            balance_after: balance_before,
            ..DispatchDetail::failed(instruction, target, reason)
        }
    }

    /// Best-effort unlock with one retry; the stale-lock sweep covers what
    /// this misses.
    fn release(&self, id: i64) {
        for attempt in 1..=2 {
            match self.instructions.unlock(id) {
                Ok(_) => return,
                Err(e) => error!(instruction_id = id, attempt, error = %e, "Failed to release lock"),
            }
        }
    }

    /// Appends the audit entry with one retry.
    fn record(&self, detail: &DispatchDetail) {
        let entry = detail.to_log_entry();
        for attempt in 1..=2 {
            match self.logs.append(&entry) {
                Ok(_) => return,
                Err(e) => error!(
                    instruction_id = detail.instruction_id,
                    outcome = %detail.outcome,
                    attempt,
                    error = %e,
                    "Failed to write execution log entry"
                ),
            }
        }
    }

    async fn notify(&self, instruction: &Instruction, detail: &DispatchDetail) {
        let Some(request) = notification_for(instruction, detail) else {
            return;
        };
        match tokio::time::timeout(self.notification_timeout, self.notifier.emit(&request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(instruction_id = instruction.id, error = %e, "Notification dropped"),
            Err(_) => warn!(instruction_id = instruction.id, "Notification timed out"),
        }
    }
}

fn notification_for(instruction: &Instruction, detail: &DispatchDetail) -> Option<NotificationRequest> {
    let (title, message, severity) = match detail.outcome {
        ExecutionOutcome::Success => {
            let units = detail.units.unwrap_or_default().round_dp(6);
            let message = match instruction.kind {
                TransactionKind::RecurringWithdraw => format!(
                    "Redeemed {units} units of {} for {}",
                    instruction.security_name, instruction.amount
                ),
                _ => format!(
                    "Bought {units} units of {} for {}",
                    instruction.security_name, instruction.amount
                ),
            };
            ("Scheduled transaction executed", message, Severity::Success)
        }
        ExecutionOutcome::Failed => (
            "Scheduled transaction failed",
            format!(
                "{} of {} in {} failed: {}",
                instruction.kind,
                instruction.amount,
                instruction.security_name,
                detail.reason.as_deref().unwrap_or("unknown error")
            ),
            Severity::Error,
        ),
        // Contention and not-due skips are internal; only stops reach the user.
        ExecutionOutcome::Skipped if detail.stopped => (
            "Scheduled transaction ended",
            format!(
                "{} in {} stopped: {}",
                instruction.kind,
                instruction.security_name,
                detail.reason.as_deref().unwrap_or("stop condition reached")
            ),
            Severity::Info,
        ),
        ExecutionOutcome::Skipped => return None,
    };
    Some(NotificationRequest {
        account_id: instruction.account_id,
        title: title.to_string(),
        message,
        severity,
    })
}
