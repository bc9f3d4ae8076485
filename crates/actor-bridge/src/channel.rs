use futures::sink::SinkExt;
use futures::stream::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::BridgeResult;
use crate::events::{ActorEvent, EventListener};
use crate::rpc::SubscriptionId;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of an event channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    /// Closed locally; terminal
    Closed,
    /// Connection dropped while open; terminal, no reconnect
    Failed(String),
}

impl ChannelState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Failed(_))
    }
}

/// Listener slot shared by the reader task and `close`. Dispatch happens while
/// holding it, so once `close` has emptied it no further event is delivered.
type Gate = Arc<Mutex<Option<EventListener>>>;

fn lock_gate(gate: &Mutex<Option<EventListener>>) -> MutexGuard<'_, Option<EventListener>> {
    gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// WebSocket stream of events for one subscription.
///
/// Listeners run on the channel's reader task and must not close their own
/// channel synchronously from inside the callback.
#[derive(Debug)]
pub struct EventChannel {
    subscription_id: SubscriptionId,
    url: String,
    gate: Gate,
    state: Arc<watch::Sender<ChannelState>>,
    shutdown: CancellationToken,
}

impl EventChannel {
    /// Connect to `url`, announce `subscription_id`, and start forwarding events
    pub async fn open(
        url: &str,
        subscription_id: SubscriptionId,
        listener: EventListener,
    ) -> BridgeResult<Self> {
        let (state, _) = watch::channel(ChannelState::Connecting);
        let state = Arc::new(state);

        info!("Opening event channel for subscription {} at {}", subscription_id, url);
        let (mut ws, response) = connect_async(url).await?;
        debug!("Event channel handshake response: {:?}", response.status());

        let handshake = serde_json::to_string(&json!({ "subscriptionId": subscription_id }))?;
        ws.send(Message::Text(handshake)).await?;
        state.send_replace(ChannelState::Open);

        let gate: Gate = Arc::new(Mutex::new(Some(listener)));
        let shutdown = CancellationToken::new();
        tokio::spawn(read_loop(
            ws,
            subscription_id,
            gate.clone(),
            state.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            subscription_id,
            url: url.to_string(),
            gate,
            state,
            shutdown,
        })
    }

    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn current_state(&self) -> ChannelState {
        self.state.borrow().clone()
    }

    /// Watch state transitions, including an unexpected drop
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// Stop delivery and close the connection. Idempotent.
    pub fn close(&self) {
        let listener = lock_gate(&self.gate).take();
        self.shutdown.cancel();
        self.state.send_replace(ChannelState::Closed);
        if listener.is_some() {
            debug!("Closed event channel for subscription {}", self.subscription_id);
        }
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        if !self.current_state().is_terminal() {
            debug!(
                "Event channel for subscription {} dropped without explicit close",
                self.subscription_id
            );
        }
        self.close();
    }
}

async fn read_loop(
    mut ws: WsStream,
    subscription_id: SubscriptionId,
    gate: Gate,
    state: Arc<watch::Sender<ChannelState>>,
    shutdown: CancellationToken,
) {
    let failure = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                if let Err(e) = ws.close(None).await {
                    debug!("Error closing event channel {}: {}", subscription_id, e);
                }
                return;
            }
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch(&gate, subscription_id, &text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => dispatch(&gate, subscription_id, &text),
                    Err(_) => warn!("Dropping non UTF-8 frame on subscription {}", subscription_id),
                },
                Some(Ok(Message::Close(frame))) => {
                    break format!("closed by server: {:?}", frame);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break e.to_string(),
                None => break "connection ended".to_string(),
            }
        }
    };

    let failed = state.send_if_modified(|current| {
        if *current == ChannelState::Open {
            *current = ChannelState::Failed(failure.clone());
            true
        } else {
            false
        }
    });
    if failed {
        warn!("Event channel for subscription {} failed: {}", subscription_id, failure);
    }
}

fn dispatch(gate: &Mutex<Option<EventListener>>, subscription_id: SubscriptionId, text: &str) {
    let event: ActorEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("Undecodable event on subscription {}: {}", subscription_id, e);
            return;
        }
    };

    let slot = lock_gate(gate);
    if let Some(listener) = slot.as_ref() {
        listener.call(event);
    }
}
