use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;
use crate::output::{print_json_or, OutputFormat};

#[derive(Args)]
pub struct RulesArgs {
    #[arg(long, default_value_os_t = crate::default_data_dir())]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

pub async fn handle(args: RulesArgs) -> Result<()> {
    let client = DaemonClient::for_data_dir(&args.data_dir)?;
    let rules = client.rules().await?;

    print_json_or(args.format, &rules, |rules| {
        let Some(rules) = rules.as_array() else { return };
        println!("{:<30} {:<8} {:<8} {}", "NAME", "ENABLED", "DRY_RUN", "LAST_STATE");
        for rule in rules {
            let name = rule.get("name").and_then(|v| v.as_str()).unwrap_or("-");
            let enabled = rule.get("enabled").and_then(|v| v.as_bool()).unwrap_or(false);
            let dry_run = rule.get("dry_run").and_then(|v| v.as_bool()).unwrap_or(false);
            let last_state = rule.get("last_state").and_then(|v| v.as_str()).unwrap_or("-");
            println!("{name:<30} {enabled:<8} {dry_run:<8} {last_state}");
        }
    });

    Ok(())
}
