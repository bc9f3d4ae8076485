use clap::Parser;
use tracing::debug;

use crate::error::CliResult;
use crate::output::ActorNames;
use crate::CommandContext;

#[derive(Debug, Parser)]
pub struct ListArgs {}

pub async fn execute_async(_args: &ListArgs, ctx: &CommandContext) -> CliResult<()> {
    debug!("Listing actors at {}", ctx.config.server.endpoint);
    let api = ctx.api()?;
    let mut names = api.get_names().await?;
    names.sort();

    ctx.output.output(&ActorNames { names }, ctx.format())
}
