//! `rex`: the operator CLI for the rule-driven automation daemon. Thin by
//! design — the daemon crate owns every behavior this binary exposes;
//! this crate only parses arguments and talks to it, either in-process
//! (`run`, `validate`) or over its HTTP surface (`rules`, `history`,
//! `fire`, `reload`).

mod client;
mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rex", version, about = "Rule-driven automation daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon in-process.
    Run(commands::run::RunArgs),
    /// Load and validate a rules directory without starting any trigger.
    Validate(commands::validate::ValidateArgs),
    /// List rules known to a running daemon.
    Rules(commands::rules::RulesArgs),
    /// Query a running daemon's execution history.
    History(commands::history::HistoryArgs),
    /// Manually fire a rule's event.
    Fire(commands::fire::FireArgs),
    /// Ask a running daemon to reload its rules directory now.
    Reload(commands::reload::ReloadArgs),
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".rex")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => commands::run::handle(args).await,
        Command::Validate(args) => commands::validate::handle(args),
        Command::Rules(args) => commands::rules::handle(args).await,
        Command::History(args) => commands::history::handle(args).await,
        Command::Fire(args) => commands::fire::handle(args).await,
        Command::Reload(args) => commands::reload::handle(args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
