use actor_bridge::ActorEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliResult;
use crate::output::{OutputFormat, OutputManager};

/// Names known to the server
#[derive(Debug, Serialize)]
pub struct ActorNames {
    pub names: Vec<String>,
}

impl OutputFormat for ActorNames {
    fn format_compact(&self, _output: &OutputManager) -> CliResult<()> {
        for name in &self.names {
            println!("{}", name);
        }
        Ok(())
    }

    fn format_pretty(&self, output: &OutputManager) -> CliResult<()> {
        if self.names.is_empty() {
            return output.info("No actors are running");
        }
        println!(
            "{}",
            output
                .theme()
                .heading()
                .apply_to(format!("{} actor(s)", self.names.len()))
        );
        for name in &self.names {
            println!("  • {}", output.theme().actor().apply_to(name));
        }
        Ok(())
    }

    fn format_table(&self, output: &OutputManager) -> CliResult<()> {
        let rows: Vec<Vec<String>> = self.names.iter().map(|n| vec![n.clone()]).collect();
        output.table(&["ACTOR"], &rows)
    }
}

#[derive(Debug, Serialize)]
pub struct ActorSpawned {
    pub name: String,
    pub class: String,
}

impl OutputFormat for ActorSpawned {
    fn format_compact(&self, output: &OutputManager) -> CliResult<()> {
        output.success(&format!("Spawned {} ({})", self.name, self.class))
    }

    fn format_pretty(&self, output: &OutputManager) -> CliResult<()> {
        output.success(&format!(
            "Spawned actor {}",
            output.theme().actor().apply_to(&self.name)
        ))?;
        println!("  Class: {}", output.theme().detail().apply_to(&self.class));
        Ok(())
    }

    fn format_table(&self, output: &OutputManager) -> CliResult<()> {
        output.table(
            &["ACTOR", "CLASS"],
            &[vec![self.name.clone(), self.class.clone()]],
        )
    }
}

#[derive(Debug, Serialize)]
pub struct MessageSent {
    pub actor: String,
    pub message_class: Option<String>,
    pub args: Value,
}

impl OutputFormat for MessageSent {
    fn format_compact(&self, output: &OutputManager) -> CliResult<()> {
        match &self.message_class {
            Some(class) => output.success(&format!("Sent {} {} to {}", class, self.args, self.actor)),
            None => output.success(&format!("Sent {} to {}", self.args, self.actor)),
        }
    }

    fn format_pretty(&self, output: &OutputManager) -> CliResult<()> {
        output.success(&format!(
            "Message delivered to {}",
            output.theme().actor().apply_to(&self.actor)
        ))?;
        if let Some(class) = &self.message_class {
            println!("  Class: {}", class);
        }
        println!("  Body:  {}", output.theme().detail().apply_to(&self.args));
        Ok(())
    }

    fn format_table(&self, output: &OutputManager) -> CliResult<()> {
        output.table(
            &["ACTOR", "CLASS", "BODY"],
            &[vec![
                self.actor.clone(),
                self.message_class.clone().unwrap_or_default(),
                self.args.to_string(),
            ]],
        )
    }
}

#[derive(Debug, Serialize)]
pub struct MessageReceived {
    pub actor: String,
    pub message: Value,
}

impl OutputFormat for MessageReceived {
    fn format_compact(&self, _output: &OutputManager) -> CliResult<()> {
        match &self.message {
            Value::String(text) => println!("{}", text),
            other => println!("{}", other),
        }
        Ok(())
    }

    fn format_pretty(&self, output: &OutputManager) -> CliResult<()> {
        println!(
            "Message from {}:",
            output.theme().actor().apply_to(&self.actor)
        );
        println!("{}", serde_json::to_string_pretty(&self.message)?);
        Ok(())
    }

    fn format_table(&self, output: &OutputManager) -> CliResult<()> {
        output.table(
            &["ACTOR", "MESSAGE"],
            &[vec![self.actor.clone(), self.message.to_string()]],
        )
    }
}

/// One event as printed by `subscribe`
#[derive(Debug, Serialize)]
pub struct EventRecord {
    pub received_at: DateTime<Utc>,
    pub subscription_id: i64,
    pub event: ActorEvent,
}

impl OutputFormat for EventRecord {
    fn format_compact(&self, output: &OutputManager) -> CliResult<()> {
        println!(
            "{} {}",
            output
                .theme()
                .detail()
                .apply_to(self.received_at.format("%H:%M:%S%.3f")),
            self.event.describe()
        );
        Ok(())
    }

    fn format_pretty(&self, output: &OutputManager) -> CliResult<()> {
        println!(
            "{} {}",
            output.theme().event_kind(self.event.event_type),
            output.theme().actor().apply_to(&self.event.source)
        );
        println!(
            "  At:           {}",
            self.received_at.format("%Y-%m-%d %H:%M:%S%.3f")
        );
        println!("  Subscription: {}", self.subscription_id);
        if let Some(message) = &self.event.message {
            println!("  Sender:       {}", message.sender_name);
            if let Some(class) = &self.event.message_class {
                println!("  Class:        {}", class);
            }
            println!("  Body:         {}", message.body);
        }
        Ok(())
    }

    fn format_table(&self, output: &OutputManager) -> CliResult<()> {
        output.table(
            &["TIME", "ACTOR", "EVENT", "CLASS"],
            &[vec![
                self.received_at.format("%H:%M:%S%.3f").to_string(),
                self.event.source.clone(),
                self.event.event_type.to_string(),
                self.event.message_class.clone().unwrap_or_default(),
            ]],
        )
    }
}

/// Per-actor message traffic seen by `monitor`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorCounters {
    pub actor: String,
    pub sent: u64,
    pub received: u64,
    pub processed: u64,
    /// received minus processed
    pub queued: u64,
}

impl ActorCounters {
    pub fn new(actor: impl Into<String>, sent: u64, received: u64, processed: u64) -> Self {
        Self {
            actor: actor.into(),
            sent,
            received,
            processed,
            queued: received.saturating_sub(processed),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MonitorSnapshot {
    pub taken_at: DateTime<Utc>,
    pub actors: Vec<ActorCounters>,
}

impl MonitorSnapshot {
    fn rows(&self) -> Vec<Vec<String>> {
        self.actors
            .iter()
            .map(|c| {
                vec![
                    c.actor.clone(),
                    c.sent.to_string(),
                    c.received.to_string(),
                    c.processed.to_string(),
                    c.queued.to_string(),
                ]
            })
            .collect()
    }
}

const MONITOR_HEADERS: [&str; 5] = ["ACTOR", "SENT", "RECEIVED", "PROCESSED", "QUEUED"];

impl OutputFormat for MonitorSnapshot {
    fn format_compact(&self, output: &OutputManager) -> CliResult<()> {
        for c in &self.actors {
            println!(
                "{} sent={} received={} processed={} queued={}",
                output.theme().actor().apply_to(&c.actor),
                c.sent,
                c.received,
                c.processed,
                output.theme().backlog(c.queued)
            );
        }
        Ok(())
    }

    fn format_pretty(&self, output: &OutputManager) -> CliResult<()> {
        println!(
            "{}",
            output.theme().heading().apply_to(format!(
                "Actor traffic at {}",
                self.taken_at.format("%H:%M:%S")
            ))
        );
        if self.actors.is_empty() {
            return output.info("No actors to monitor");
        }
        output.table(&MONITOR_HEADERS, &self.rows())
    }

    fn format_table(&self, output: &OutputManager) -> CliResult<()> {
        output.table(&MONITOR_HEADERS, &self.rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actor_bridge::ActorEventType;

    #[test]
    fn test_queued_is_received_minus_processed() {
        let counters = ActorCounters::new("printer", 4, 5, 3);
        assert_eq!(counters.queued, 2);
        assert_eq!(ActorCounters::new("idle", 0, 0, 0).queued, 0);
    }

    #[test]
    fn test_snapshot_rows() {
        let snapshot = MonitorSnapshot {
            taken_at: Utc::now(),
            actors: vec![ActorCounters::new("printer", 1, 2, 1)],
        };
        assert_eq!(
            snapshot.rows(),
            vec![vec!["printer", "1", "2", "1", "1"]]
        );
    }

    #[test]
    fn test_event_record_serializes_event_fields() {
        let record = EventRecord {
            received_at: Utc::now(),
            subscription_id: 7,
            event: ActorEvent {
                source: "printer".to_string(),
                event_type: ActorEventType::Created,
                message: None,
                message_class: None,
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["subscription_id"], 7);
        assert_eq!(value["event"]["eventType"], "CREATED");
        assert_eq!(value["event"]["source"], "printer");
    }
}
