use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::client::DaemonClient;

#[derive(Args)]
pub struct FireArgs {
    pub rule_name: String,

    /// `key=value` pairs merged into the fired event's data map.
    #[arg(long = "data", value_name = "KEY=VALUE")]
    pub data: Vec<String>,

    #[arg(long, default_value_os_t = crate::default_data_dir())]
    pub data_dir: PathBuf,
}

pub async fn handle(args: FireArgs) -> Result<()> {
    let mut data = serde_json::Map::new();
    for pair in &args.data {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("--data expects key=value, got `{pair}`");
        };
        data.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    let client = DaemonClient::for_data_dir(&args.data_dir)?;
    client.fire(&args.rule_name, data).await?;
    println!("fired {}", args.rule_name);
    Ok(())
}
