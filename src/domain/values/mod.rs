pub mod execution_outcome;
pub mod frequency;
pub mod lifecycle;
pub mod severity;
pub mod stop_condition;
pub mod transaction_kind;
