use actor_bridge::{ActorEvent, ActorEventType, BridgeError, ChannelState, EventListener};
use chrono::Utc;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::CliResult;
use crate::output::EventRecord;
use crate::CommandContext;

#[derive(Debug, Parser)]
pub struct SubscribeArgs {
    /// Event kind to receive (repeatable); all kinds when omitted
    #[arg(short, long = "event", value_name = "KIND")]
    pub events: Vec<ActorEventType>,

    /// Actor to watch (repeatable); all actors when omitted
    #[arg(short, long = "actor", value_name = "NAME")]
    pub actors: Vec<String>,

    /// Stop after this many events (0 for unlimited)
    #[arg(short, long, default_value = "0")]
    pub limit: usize,
}

impl SubscribeArgs {
    pub fn kinds(&self) -> Vec<ActorEventType> {
        if self.events.is_empty() {
            ActorEventType::ALL.to_vec()
        } else {
            self.events.clone()
        }
    }
}

enum Ended {
    Interrupted,
    LimitReached,
    ChannelFailed(String),
}

pub async fn execute_async(args: &SubscribeArgs, ctx: &CommandContext) -> CliResult<()> {
    let api = ctx.api()?;
    let (tx, mut events) = mpsc::unbounded_channel::<ActorEvent>();
    let listener = EventListener::new(move |event| {
        let _ = tx.send(event);
    });

    let subscription_id = api.subscribe(&args.kinds(), &args.actors, listener).await?;
    info!("Subscribed with id {}", subscription_id);
    let mut state = api
        .subscription_state(subscription_id)
        .await
        .ok_or_else(|| BridgeError::ChannelFailed {
            id: subscription_id,
            reason: "closed before it was used".to_string(),
        })?;

    if !ctx.json {
        ctx.output.info(&format!(
            "Subscribed ({}), waiting for events...",
            subscription_id
        ))?;
    }

    let mut received = 0usize;
    let ended = loop {
        tokio::select! {
            _ = ctx.shutdown_token.cancelled() => break Ended::Interrupted,
            Some(event) = events.recv() => {
                let record = EventRecord {
                    received_at: Utc::now(),
                    subscription_id: subscription_id.value(),
                    event,
                };
                if ctx.json {
                    println!("{}", serde_json::to_string(&record)?);
                } else {
                    ctx.output.output(&record, None)?;
                }
                received += 1;
                if args.limit > 0 && received >= args.limit {
                    break Ended::LimitReached;
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break Ended::ChannelFailed("event channel went away".to_string());
                }
                let current = state.borrow_and_update().clone();
                if let ChannelState::Failed(reason) = current {
                    break Ended::ChannelFailed(reason);
                }
            }
        }
    };

    debug!("Subscription {} ended after {} event(s)", subscription_id, received);
    if let Err(e) = api.unsubscribe(subscription_id).await {
        warn!("Failed to unsubscribe {}: {}", subscription_id, e);
    }
    api.shutdown().await?;

    match ended {
        Ended::Interrupted => {
            if !ctx.json {
                ctx.output.info(&format!("Stopped after {} event(s)", received))?;
            }
            Ok(())
        }
        Ended::LimitReached => {
            if !ctx.json {
                ctx.output
                    .info(&format!("Reached event limit ({}), exiting", args.limit))?;
            }
            Ok(())
        }
        Ended::ChannelFailed(reason) => Err(BridgeError::ChannelFailed {
            id: subscription_id,
            reason,
        }
        .into()),
    }
}
