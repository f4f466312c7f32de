use autoinvest::cli::commands::{Cli, Commands};
use autoinvest::config::SchedulerConfig;
use autoinvest::domain::entities::instruction::NewInstruction;
use autoinvest::domain::ports::instruction_repository::InstructionFilter;
use autoinvest::domain::values::lifecycle::LifecycleState;
use autoinvest::logging::init_logging;
use autoinvest::AutoInvest;
use chrono::NaiveDate;
use clap::Parser;
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match SchedulerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error reading configuration: {e}");
            std::process::exit(1);
        }
    };
    init_logging(&config);

    let ai = match AutoInvest::with_config(&config) {
        Ok(ai) => ai,
        Err(e) => {
            eprintln!("Error initializing scheduler: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(ai, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(ai: AutoInvest, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Run { date } => {
            let summary = ai.run(parse_date(&date)?).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Due { date } => {
            let due = ai.due(parse_date(&date)?)?;
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        Commands::Execute { id, date } => {
            let detail = ai.execute_instruction(id, parse_date(&date)?).await?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        Commands::Unlock { id } => {
            ai.force_unlock(id)?;
            println!("Unlocked instruction {id}");
        }
        Commands::ReleaseStale => {
            let released = ai.release_stale_locks()?;
            println!("Released {released} stale locks");
        }
        Commands::InstructionAdd { json } => {
            let new: NewInstruction = serde_json::from_str(&json)?;
            let instruction = ai.create_instruction(new)?;
            println!("{}", serde_json::to_string_pretty(&instruction)?);
        }
        Commands::Instructions {
            account,
            lifecycle,
            limit,
        } => {
            let lifecycle: Option<LifecycleState> = lifecycle
                .map(|l| l.parse())
                .transpose()
                .map_err(|e: String| e)?;
            let filter = InstructionFilter {
                account_id: account,
                lifecycle,
                limit: Some(limit),
            };
            let instructions = ai.list_instructions(&filter)?;
            println!("{}", serde_json::to_string_pretty(&instructions)?);
        }
        Commands::Show { id } => {
            let instruction = ai.get_instruction(id)?;
            println!("{}", serde_json::to_string_pretty(&instruction)?);
        }
        Commands::Cancel { id } => {
            let instruction = ai.cancel_instruction(id)?;
            println!("{}", serde_json::to_string_pretty(&instruction)?);
        }
        Commands::Deposit { account, amount } => {
            let balance = ai.deposit(account, parse_amount(&amount)?)?;
            println!("{}", json!({ "account_id": account, "balance": balance }));
        }
        Commands::Balance { account } => {
            let balance = ai.balance(account)?;
            println!("{}", json!({ "account_id": account, "balance": balance }));
        }
        Commands::Holdings { account } => {
            let holdings = ai.holdings(account)?;
            println!("{}", serde_json::to_string_pretty(&holdings)?);
        }
        Commands::ValuationSet { code, value, as_of } => {
            let as_of = parse_date(&as_of)?.unwrap_or_else(AutoInvest::today);
            ai.record_valuation(&code, parse_amount(&value)?, as_of)?;
            println!("Recorded {code} = {value} as of {as_of}");
        }
        Commands::History { id } => {
            let entries = ai.history(id)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Notifications { account } => {
            let notifications = ai.notifications(account)?;
            for n in &notifications {
                println!("[{}] {} {}: {}", n.request.severity, n.created_at, n.request.title, n.request.message);
            }
        }
    }
    Ok(())
}

fn parse_date(s: &Option<String>) -> Result<Option<NaiveDate>, String> {
    s.as_deref()
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| format!("Invalid date format: {s}. Use YYYY-MM-DD"))
        })
        .transpose()
}

fn parse_amount(s: &str) -> Result<Decimal, String> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| format!("Invalid amount {s}: {e}"))
}
