use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct RunArgs {
    /// Directory holding `config.yaml`, `rules/`, `state/`, `logs/`.
    #[arg(long, default_value_os_t = crate::default_data_dir())]
    pub data_dir: PathBuf,

    /// Also mirror logs to stdout (always on in addition to the rotating
    /// log file).
    #[arg(long)]
    pub foreground: bool,
}

pub async fn handle(args: RunArgs) -> Result<()> {
    let daemon_exe = std::env::current_exe().ok();
    let daemon = rex_daemon::Daemon::bootstrap(args.data_dir, args.foreground, daemon_exe)?;

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown_cancel.cancel();
    });

    daemon.run(cancel).await?;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
