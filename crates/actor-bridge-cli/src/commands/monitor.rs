use actor_bridge::{ActorApi, ActorEventType, ActorProxy, EventListener};
use chrono::Utc;
use clap::Parser;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::CliResult;
use crate::output::{ActorCounters, MonitorSnapshot};
use crate::CommandContext;

const WATCHED_KINDS: [ActorEventType; 3] = [
    ActorEventType::MessageSent,
    ActorEventType::MessageReceived,
    ActorEventType::MessageProcessed,
];

#[derive(Debug, Parser)]
pub struct MonitorArgs {
    /// Seconds between table refreshes
    #[arg(short, long, default_value = "2")]
    pub refresh_secs: u64,
}

/// Message traffic counters for one actor, updated from its event channel
#[derive(Debug, Default)]
pub struct TrafficCounters {
    sent: AtomicU64,
    received: AtomicU64,
    processed: AtomicU64,
}

impl TrafficCounters {
    pub fn record(&self, kind: ActorEventType) {
        let counter = match kind {
            ActorEventType::MessageSent => &self.sent,
            ActorEventType::MessageReceived => &self.received,
            ActorEventType::MessageProcessed => &self.processed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, actor: &str) -> ActorCounters {
        ActorCounters::new(
            actor,
            self.sent.load(Ordering::Relaxed),
            self.received.load(Ordering::Relaxed),
            self.processed.load(Ordering::Relaxed),
        )
    }
}

struct Watched {
    proxy: ActorProxy,
    counters: Arc<TrafficCounters>,
}

pub async fn execute_async(args: &MonitorArgs, ctx: &CommandContext) -> CliResult<()> {
    let api = ctx.api()?;
    let mut names = api.get_names().await?;
    names.sort();
    if names.is_empty() {
        return ctx.output.info("No actors to monitor");
    }

    let mut watched = Vec::with_capacity(names.len());
    for name in names {
        let counters = Arc::new(TrafficCounters::default());
        let proxy = ActorProxy::new(name, api.clone());
        let sink = counters.clone();
        let listener = EventListener::new(move |event| sink.record(event.event_type));

        if let Err(e) = proxy.add_event_listener(WATCHED_KINDS, listener).await {
            release(&watched, &api).await;
            return Err(e.into());
        }
        debug!("Monitoring {}", proxy.actor_name());
        watched.push(Watched { proxy, counters });
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(args.refresh_secs.max(1)));
    loop {
        tokio::select! {
            _ = ctx.shutdown_token.cancelled() => break,
            _ = ticker.tick() => {
                if !ctx.json && ctx.output.term().is_term() {
                    ctx.output.term().clear_screen()?;
                }
                ctx.output.output(&snapshot(&watched), ctx.format())?;
            }
        }
    }

    let final_snapshot = snapshot(&watched);
    release(&watched, &api).await;
    ctx.output.output(&final_snapshot, ctx.format())
}

fn snapshot(watched: &[Watched]) -> MonitorSnapshot {
    MonitorSnapshot {
        taken_at: Utc::now(),
        actors: watched
            .iter()
            .map(|w| w.counters.snapshot(w.proxy.actor_name()))
            .collect(),
    }
}

async fn release(watched: &[Watched], api: &ActorApi) {
    for w in watched {
        if let Err(e) = w.proxy.remove_all_event_listeners().await {
            warn!("Failed to release listeners on {}: {}", w.proxy.actor_name(), e);
        }
    }
    if let Err(e) = api.shutdown().await {
        warn!("Shutdown reported: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_traffic_kinds() {
        let counters = TrafficCounters::default();
        counters.record(ActorEventType::MessageReceived);
        counters.record(ActorEventType::MessageReceived);
        counters.record(ActorEventType::MessageProcessed);
        counters.record(ActorEventType::MessageSent);
        counters.record(ActorEventType::Created);

        assert_eq!(
            counters.snapshot("printer"),
            ActorCounters::new("printer", 1, 2, 1)
        );
        assert_eq!(counters.snapshot("printer").queued, 1);
    }
}
