use clap::Parser;
use serde_json::Value;
use tracing::debug;

use crate::commands::parse_body;
use crate::error::{CliError, CliResult};
use crate::output::MessageSent;
use crate::CommandContext;

#[derive(Debug, Parser)]
pub struct SendArgs {
    /// Actor to deliver the message to
    pub actor: String,

    /// Message body; each value is read as JSON when possible, else as a string
    #[arg(required = true, num_args = 1..)]
    pub body: Vec<String>,

    /// Message class; all bodies then form its argument list
    #[arg(short, long)]
    pub class: Option<String>,
}

/// Turn the command-line bodies into the arguments `api.send` expects
pub fn message_args(body: &[String], class: Option<&str>) -> CliResult<Value> {
    let mut values: Vec<Value> = body.iter().map(|raw| parse_body(raw)).collect();
    match class {
        Some(_) => Ok(Value::Array(values)),
        None if values.len() == 1 => Ok(values.remove(0)),
        None => Err(CliError::invalid_input(
            "body",
            body.join(" "),
            "Several values need a message class: pass --class <CLASS>",
        )),
    }
}

pub async fn execute_async(args: &SendArgs, ctx: &CommandContext) -> CliResult<()> {
    let message = message_args(&args.body, args.class.as_deref())?;
    debug!("Sending {} to {} (class {:?})", message, args.actor, args.class);

    let api = ctx.api()?;
    api.send(&args.actor, message.clone(), args.class.as_deref())
        .await?;

    ctx.output.output(
        &MessageSent {
            actor: args.actor.clone(),
            message_class: args.class.clone(),
            args: message,
        },
        ctx.format(),
    )
}
