pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use actor_bridge::ActorApi;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::CliResult;

/// actor-bridge - talk to remote actors over JSON-RPC or XML-RPC and watch
/// their events.
#[derive(Debug, Parser)]
#[command(name = "actor-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Turn on verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Display output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// RPC endpoint, overriding the configured one
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Spawn a new actor
    #[command(name = "spawn")]
    Spawn(commands::spawn::SpawnArgs),

    /// List actor names
    #[command(name = "list")]
    List(commands::list::ListArgs),

    /// Send a message to an actor
    #[command(name = "send")]
    Send(commands::send::SendArgs),

    /// Receive a message from an actor's mailbox
    #[command(name = "receive")]
    Receive(commands::receive::ReceiveArgs),

    /// Print actor events as they arrive
    #[command(name = "subscribe")]
    Subscribe(commands::subscribe::SubscribeArgs),

    /// Live table of per-actor message traffic
    #[command(name = "monitor")]
    Monitor(commands::monitor::MonitorArgs),
}

impl Commands {
    /// Commands that run until interrupted and clean up on their own
    fn watches_shutdown(&self) -> bool {
        matches!(self, Commands::Subscribe(_) | Commands::Monitor(_))
    }
}

/// Run the CLI with cancellation support
pub async fn run(
    cli: Cli,
    mut config: config::Config,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    if let Some(endpoint) = &cli.endpoint {
        config.server.endpoint = endpoint.clone();
    }

    let output = output::OutputManager::new(config.output.clone());
    let ctx = CommandContext {
        config,
        output,
        verbose: cli.verbose,
        json: cli.json,
        shutdown_token: shutdown_token.clone(),
    };

    let command_future = async {
        match &cli.command {
            Commands::Spawn(args) => commands::spawn::execute_async(args, &ctx).await,
            Commands::List(args) => commands::list::execute_async(args, &ctx).await,
            Commands::Send(args) => commands::send::execute_async(args, &ctx).await,
            Commands::Receive(args) => commands::receive::execute_async(args, &ctx).await,
            Commands::Subscribe(args) => commands::subscribe::execute_async(args, &ctx).await,
            Commands::Monitor(args) => commands::monitor::execute_async(args, &ctx).await,
        }
    };

    // Long-running commands observe the token themselves so they can unsubscribe
    let result = if cli.command.watches_shutdown() {
        command_future.await
    } else {
        tokio::select! {
            result = command_future => result,
            _ = shutdown_token.cancelled() => {
                return Err(anyhow::anyhow!("Operation cancelled"));
            }
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!("Command failed ({}): {:?}", e.category(), e);
            ctx.output.error(&e.user_message())?;
            if ctx.verbose {
                eprintln!("\nDebug info: {:?}", e);
            }
            std::process::exit(1);
        }
    }
}

/// Shared context for command execution
pub struct CommandContext {
    pub config: config::Config,
    pub output: output::OutputManager,
    pub verbose: bool,
    pub json: bool,
    pub shutdown_token: CancellationToken,
}

impl CommandContext {
    /// Connect to the configured endpoint
    pub fn api(&self) -> CliResult<Arc<ActorApi>> {
        Ok(Arc::new(ActorApi::connect(&self.config.client_config())?))
    }

    /// Format override from `--json`
    pub fn format(&self) -> Option<&str> {
        if self.json {
            Some("json")
        } else {
            None
        }
    }
}
