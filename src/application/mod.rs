pub mod dispatcher;
pub mod handlers;
pub mod history;
pub mod instructions;
pub mod ledger;
pub mod run_batch;
