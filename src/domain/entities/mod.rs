pub mod execution_log;
pub mod holding;
pub mod instruction;
pub mod notification;
pub mod valuation;
