pub mod execution_log_repository;
pub mod instruction_repository;
pub mod ledger_repository;
pub mod notification_emitter;
pub mod valuation_reader;
