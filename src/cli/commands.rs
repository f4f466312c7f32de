use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "autoinvest", about = "Recurring purchase and withdrawal scheduler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the batch for a date: release stale locks, then execute everything due
    Run {
        /// Target date (YYYY-MM-DD, defaults to today in UTC)
        #[arg(long)]
        date: Option<String>,
    },
    /// List instructions a run would pick up, without executing them
    Due {
        #[arg(long)]
        date: Option<String>,
    },
    /// Execute one instruction immediately, outside a batch
    Execute {
        id: i64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Force-release an instruction lock
    Unlock { id: i64 },
    /// Release locks older than the stale threshold
    ReleaseStale,
    /// Create an instruction
    InstructionAdd {
        /// JSON with account_id, security_code, security_name, kind, amount, frequency, start_date, end_date, installment_cap
        json: String,
    },
    /// List instructions
    Instructions {
        #[arg(long)]
        account: Option<i64>,
        /// Lifecycle filter (pending, active, cancelled)
        #[arg(long)]
        lifecycle: Option<String>,
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Show a single instruction
    Show { id: i64 },
    /// Cancel an instruction
    Cancel { id: i64 },
    /// Credit cash to an account
    Deposit { account: i64, amount: String },
    /// Show an account's cash balance
    Balance { account: i64 },
    /// List an account's holdings
    Holdings { account: i64 },
    /// Record a per-unit valuation for a security
    ValuationSet {
        code: String,
        value: String,
        /// Valuation date (YYYY-MM-DD, defaults to today in UTC)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Execution log for an instruction
    History { id: i64 },
    /// Notifications sent to an account
    Notifications { account: i64 },
}
