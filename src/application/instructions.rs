use crate::domain::entities::instruction::{Instruction, NewInstruction};
use crate::domain::error::DomainError;
use crate::domain::ports::instruction_repository::{InstructionFilter, InstructionRepository};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Intake and operator maintenance of instructions.
pub struct InstructionUseCase {
    repo: Arc<dyn InstructionRepository>,
}

impl InstructionUseCase {
    pub fn new(repo: Arc<dyn InstructionRepository>) -> Self {
        Self { repo }
    }

    pub fn create(&self, new: NewInstruction, today: NaiveDate) -> Result<Instruction, DomainError> {
        let mut instruction = Instruction::new(new, today)?;
        instruction.id = self.repo.add(&instruction)?;
        info!(
            instruction_id = instruction.id,
            kind = %instruction.kind,
            lifecycle = %instruction.lifecycle,
            "Instruction created"
        );
        Ok(instruction)
    }

    pub fn get(&self, id: i64) -> Result<Instruction, DomainError> {
        self.repo
            .get(id)?
            .ok_or_else(|| DomainError::NotFound(format!("Instruction not found: {id}")))
    }

    pub fn list(&self, filter: &InstructionFilter) -> Result<Vec<Instruction>, DomainError> {
        self.repo.list(filter)
    }

    pub fn cancel(&self, id: i64) -> Result<Instruction, DomainError> {
        if !self.repo.cancel(id, "cancelled by operator")? {
            return Err(DomainError::NotFound(format!("Instruction not found: {id}")));
        }
        info!(instruction_id = id, "Instruction cancelled by operator");
        self.get(id)
    }

    /// Clears a lock immediately, ignoring the staleness threshold.
    pub fn force_unlock(&self, id: i64) -> Result<(), DomainError> {
        if !self.repo.unlock(id)? {
            return Err(DomainError::NotFound(format!("Instruction not found: {id}")));
        }
        info!(instruction_id = id, "Lock force-released");
        Ok(())
    }
}
