use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::BridgeError;

/// Kinds of lifecycle and traffic events an actor can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorEventType {
    Created,
    Stopped,
    Aborted,
    MessageSent,
    MessageReceived,
    MessageProcessed,
}

impl ActorEventType {
    /// Every known event kind, in wire order
    pub const ALL: [ActorEventType; 6] = [
        ActorEventType::Created,
        ActorEventType::Stopped,
        ActorEventType::Aborted,
        ActorEventType::MessageSent,
        ActorEventType::MessageReceived,
        ActorEventType::MessageProcessed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorEventType::Created => "CREATED",
            ActorEventType::Stopped => "STOPPED",
            ActorEventType::Aborted => "ABORTED",
            ActorEventType::MessageSent => "MESSAGE_SENT",
            ActorEventType::MessageReceived => "MESSAGE_RECEIVED",
            ActorEventType::MessageProcessed => "MESSAGE_PROCESSED",
        }
    }
}

impl fmt::Display for ActorEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorEventType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        ActorEventType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                BridgeError::contract_violation(format!("unknown actor event type '{}'", s))
            })
    }
}

/// Message payload attached to traffic events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorEventMessage {
    pub sender_name: String,
    #[serde(default)]
    pub body: Value,
}

/// One push notification about an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorEvent {
    pub source: String,
    pub event_type: ActorEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ActorEventMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_class: Option<String>,
}

impl ActorEvent {
    /// One-line human readable description of the event
    pub fn describe(&self) -> String {
        let mut text = format!(
            "Received event '{}' from actor '{}'",
            self.event_type, self.source
        );
        if let Some(message) = &self.message {
            let body = match &message.body {
                Value::String(s) if s.is_empty() => "empty message".to_string(),
                Value::String(s) => format!("message '{}'", s),
                other => format!("message '{}'", other),
            };
            text.push_str(&format!(
                " with {} of type '{}' from '{}'",
                body,
                self.message_class.as_deref().unwrap_or(""),
                message.sender_name
            ));
        }
        text
    }
}

/// Which event kinds a listener wants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSelection {
    All,
    One(ActorEventType),
    Many(Vec<ActorEventType>),
}

impl EventSelection {
    pub fn into_kinds(self) -> Vec<ActorEventType> {
        match self {
            EventSelection::All => ActorEventType::ALL.to_vec(),
            EventSelection::One(kind) => vec![kind],
            EventSelection::Many(kinds) => kinds,
        }
    }
}

impl From<ActorEventType> for EventSelection {
    fn from(kind: ActorEventType) -> Self {
        EventSelection::One(kind)
    }
}

impl From<Vec<ActorEventType>> for EventSelection {
    fn from(kinds: Vec<ActorEventType>) -> Self {
        EventSelection::Many(kinds)
    }
}

impl From<&[ActorEventType]> for EventSelection {
    fn from(kinds: &[ActorEventType]) -> Self {
        EventSelection::Many(kinds.to_vec())
    }
}

impl<const N: usize> From<[ActorEventType; N]> for EventSelection {
    fn from(kinds: [ActorEventType; N]) -> Self {
        EventSelection::Many(kinds.to_vec())
    }
}

/// A shareable event callback.
///
/// Identity is the identity of the shared callback: clones of one listener are
/// the same listener, two listeners built from identical closures are not.
///
/// Callbacks run on the channel's reader task while delivery is gated, so a
/// concurrent `close` waits for them. Keep them short and non-blocking; hand
/// real work off to a channel or a spawned task.
#[derive(Clone)]
pub struct EventListener {
    callback: Arc<dyn Fn(ActorEvent) + Send + Sync>,
}

impl EventListener {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ActorEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn call(&self, event: ActorEvent) {
        (self.callback)(event)
    }

    /// Stable identity key for this listener and its clones
    pub fn id(&self) -> ListenerId {
        ListenerId(Arc::as_ptr(&self.callback) as *const () as usize)
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("id", &self.id())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_event_decodes_from_wire_shape() {
        let event: ActorEvent = serde_json::from_value(json!({
            "source": "pinger",
            "eventType": "MESSAGE_SENT",
            "message": { "senderName": "ponger", "body": "hi" },
            "messageClass": "Ping"
        }))
        .unwrap();

        assert_eq!(event.source, "pinger");
        assert_eq!(event.event_type, ActorEventType::MessageSent);
        assert_eq!(
            event.message,
            Some(ActorEventMessage {
                sender_name: "ponger".to_string(),
                body: json!("hi"),
            })
        );
        assert_eq!(event.message_class.as_deref(), Some("Ping"));
    }

    #[test]
    fn test_lifecycle_event_without_message() {
        let event: ActorEvent =
            serde_json::from_str(r#"{"source":"a","eventType":"CREATED"}"#).unwrap();
        assert!(event.message.is_none());
        assert_eq!(
            event.describe(),
            "Received event 'CREATED' from actor 'a'"
        );
    }

    #[test]
    fn test_describe_traffic_event() {
        let event = ActorEvent {
            source: "a".to_string(),
            event_type: ActorEventType::MessageReceived,
            message: Some(ActorEventMessage {
                sender_name: "b".to_string(),
                body: json!(""),
            }),
            message_class: None,
        };
        assert_eq!(
            event.describe(),
            "Received event 'MESSAGE_RECEIVED' from actor 'a' with empty message of type '' from 'b'"
        );
    }

    #[test]
    fn test_event_type_parsing() {
        assert_eq!(
            "message-processed".parse::<ActorEventType>().unwrap(),
            ActorEventType::MessageProcessed
        );
        assert_eq!("STOPPED".parse::<ActorEventType>().unwrap(), ActorEventType::Stopped);
        assert!("EXPLODED".parse::<ActorEventType>().is_err());
    }

    #[test]
    fn test_selection_all_covers_every_kind() {
        assert_eq!(EventSelection::All.into_kinds().len(), 6);
        assert_eq!(
            EventSelection::from(ActorEventType::Aborted).into_kinds(),
            vec![ActorEventType::Aborted]
        );
    }

    #[test]
    fn test_listener_identity_follows_clones() {
        let a = EventListener::new(|_| {});
        let b = EventListener::new(|_| {});
        assert_eq!(a.id(), a.clone().id());
        assert_ne!(a.id(), b.id());
    }
}
