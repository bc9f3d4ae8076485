use clap::Parser;
use tracing::debug;

use crate::error::CliResult;
use crate::output::MessageReceived;
use crate::CommandContext;

#[derive(Debug, Parser)]
pub struct ReceiveArgs {
    /// Actor whose mailbox to read
    pub actor: String,

    /// Give up after this many milliseconds; the server default applies when omitted
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

pub async fn execute_async(args: &ReceiveArgs, ctx: &CommandContext) -> CliResult<()> {
    debug!("Receiving from {} (timeout {:?})", args.actor, args.timeout);
    let api = ctx.api()?;
    let message = api.receive(&args.actor, args.timeout).await?;

    ctx.output.output(
        &MessageReceived {
            actor: args.actor.clone(),
            message,
        },
        ctx.format(),
    )
}
