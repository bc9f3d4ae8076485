use clap::Parser;
use tracing::debug;

use crate::error::CliResult;
use crate::output::ActorSpawned;
use crate::CommandContext;

#[derive(Debug, Parser)]
pub struct SpawnArgs {
    /// Name the new actor is addressed by
    pub name: String,

    /// Actor class to instantiate on the server
    pub class: String,
}

pub async fn execute_async(args: &SpawnArgs, ctx: &CommandContext) -> CliResult<()> {
    debug!("Spawning {} as {}", args.name, args.class);
    let api = ctx.api()?;
    api.spawn_actor(&args.name, &args.class).await?;

    ctx.output.output(
        &ActorSpawned {
            name: args.name.clone(),
            class: args.class.clone(),
        },
        ctx.format(),
    )
}
