//! Batch runner: releases stale leases, selects due instructions and
//! dispatches each one, aggregating a run summary.

use crate::application::dispatcher::{DispatchDetail, ExecutionDispatcher};
use crate::domain::entities::instruction::Instruction;
use crate::domain::error::DomainError;
use crate::domain::ports::instruction_repository::InstructionRepository;
use crate::domain::values::execution_outcome::ExecutionOutcome;
use crate::domain::values::transaction_kind::TransactionKind;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub target_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub released_stale_locks: usize,
    pub total_due: usize,
    pub executed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_invested: Decimal,
    pub total_withdrawn: Decimal,
    pub details: Vec<DispatchDetail>,
}

impl RunSummary {
    fn new(run_id: String, target_date: NaiveDate, released_stale_locks: usize, total_due: usize) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            target_date,
            started_at: now,
            finished_at: now,
            released_stale_locks,
            total_due,
            executed: 0,
            failed: 0,
            skipped: 0,
            total_invested: Decimal::ZERO,
            total_withdrawn: Decimal::ZERO,
            details: Vec::new(),
        }
    }

    /// Counts a detail, using its source instruction to classify the money
    /// it moved.
    fn record(&mut self, detail: DispatchDetail, source: Option<&Instruction>) {
        match detail.outcome {
            ExecutionOutcome::Success => {
                self.executed += 1;
                match source.map(|s| s.kind) {
                    Some(kind) if kind.is_purchase() => self.total_invested += detail.amount,
                    Some(TransactionKind::RecurringWithdraw) => self.total_withdrawn += detail.amount,
                    _ => {}
                }
            }
            ExecutionOutcome::Failed => self.failed += 1,
            ExecutionOutcome::Skipped => self.skipped += 1,
        }
        self.details.push(detail);
    }
}

pub struct RunBatchUseCase {
    instructions: Arc<dyn InstructionRepository>,
    dispatcher: Arc<ExecutionDispatcher>,
    stale_lock_threshold: chrono::Duration,
}

impl RunBatchUseCase {
    pub fn new(
        instructions: Arc<dyn InstructionRepository>,
        dispatcher: Arc<ExecutionDispatcher>,
        stale_lock_threshold: chrono::Duration,
    ) -> Self {
        Self {
            instructions,
            dispatcher,
            stale_lock_threshold,
        }
    }

    /// Processes everything due on `target`. Individual failures are
    /// reported in the summary; only the sweep and selection can fail the run.
    pub async fn execute(&self, target: NaiveDate) -> Result<RunSummary, DomainError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("batch_run", run_id = %run_id, target = %target);
        self.run(run_id, target).instrument(span).await
    }

    async fn run(&self, run_id: String, target: NaiveDate) -> Result<RunSummary, DomainError> {
        let released = self.release_stale_locks()?;
        let due = self.instructions.find_due(target)?;
        info!(due = due.len(), released_stale_locks = released, "Batch run started");

        let mut summary = RunSummary::new(run_id, target, released, due.len());
        let sources: HashMap<i64, &Instruction> = due.iter().map(|i| (i.id, i)).collect();

        for instruction in &due {
            let detail = self.dispatcher.dispatch(instruction, target).await;
            let source = sources.get(&detail.instruction_id).copied();
            summary.record(detail, source);
        }
        summary.finished_at = Utc::now();

        info!(
            executed = summary.executed,
            failed = summary.failed,
            skipped = summary.skipped,
            invested = %summary.total_invested,
            withdrawn = %summary.total_withdrawn,
            "Batch run finished"
        );
        Ok(summary)
    }

    /// Read-only projection of what a run on `target` would pick up.
    pub fn due(&self, target: NaiveDate) -> Result<Vec<Instruction>, DomainError> {
        self.instructions.find_due(target)
    }

    pub fn release_stale_locks(&self) -> Result<usize, DomainError> {
        let cutoff = Utc::now() - self.stale_lock_threshold;
        let released = self.instructions.release_stale_locks(cutoff)?;
        if released > 0 {
            info!(released, "Released stale instruction locks");
        }
        Ok(released)
    }

    /// Dispatches one instruction outside a batch, regardless of whether
    /// selection would pick it.
    pub async fn execute_one(&self, id: i64, target: NaiveDate) -> Result<DispatchDetail, DomainError> {
        let instruction = self
            .instructions
            .get(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Instruction not found: {id}")))?;
        Ok(self.dispatcher.dispatch(&instruction, target).await)
    }
}
