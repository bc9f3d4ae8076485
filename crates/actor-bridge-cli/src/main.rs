use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use actor_bridge::logging::setup_logging;
use actor_bridge_cli::{config::Config, run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()
    };
    setup_logging(&log_level, config.logging.file.as_deref(), true)?;

    let shutdown_token = CancellationToken::new();
    let ctrl_c_token = shutdown_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        ctrl_c_token.cancel();
    });

    run(cli, config, shutdown_token).await
}
