use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;

#[derive(Args)]
pub struct ReloadArgs {
    #[arg(long, default_value_os_t = crate::default_data_dir())]
    pub data_dir: PathBuf,
}

pub async fn handle(args: ReloadArgs) -> Result<()> {
    let client = DaemonClient::for_data_dir(&args.data_dir)?;
    client.reload().await?;
    println!("reload requested");
    Ok(())
}
