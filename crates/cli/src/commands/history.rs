use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;
use crate::output::{print_json_or, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(long, default_value_os_t = crate::default_data_dir())]
    pub data_dir: PathBuf,

    /// Filter to one rule.
    #[arg(long)]
    pub rule: Option<String>,

    /// Filter to one execution state (success|failure|timeout|cancelled).
    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub limit: Option<u32>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub async fn handle(args: HistoryArgs) -> Result<()> {
    let client = DaemonClient::for_data_dir(&args.data_dir)?;
    let records = client.history(args.rule.as_deref(), args.state.as_deref(), args.limit).await?;

    print_json_or(args.format, &records, |records| {
        let Some(records) = records.as_array() else { return };
        println!("{:<30} {:<10} {:<12} {}", "RULE", "STATE", "STARTED_AT", "ERROR");
        for record in records {
            let rule = record.get("rule_name").and_then(|v| v.as_str()).unwrap_or("-");
            let state = record.get("state").and_then(|v| v.as_str()).unwrap_or("-");
            let started_at = record.get("started_at").and_then(|v| v.as_str()).unwrap_or("-");
            let error = record.get("error").and_then(|v| v.as_str()).unwrap_or("");
            println!("{rule:<30} {state:<10} {started_at:<12} {error}");
        }
    });

    Ok(())
}
