#![allow(dead_code)]

use actor_bridge::{BridgeResult, RpcTransport};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Local WebSocket endpoint standing in for the server's event push side.
///
/// Each connection is registered under the subscription id from its
/// handshake so tests can push frames to it.
pub struct EventHub {
    addr: String,
    handshakes: tokio::sync::Mutex<mpsc::UnboundedReceiver<Value>>,
    connections: Arc<Mutex<HashMap<i64, mpsc::UnboundedSender<String>>>>,
}

impl EventHub {
    pub async fn start() -> Arc<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (handshake_tx, handshake_rx) = mpsc::unbounded_channel();
        let connections: Arc<Mutex<HashMap<i64, mpsc::UnboundedSender<String>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let registry = connections.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let registry = registry.clone();
                let handshake_tx = handshake_tx.clone();
                tokio::spawn(async move {
                    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                        return;
                    };
                    let Some(Ok(Message::Text(text))) = ws.next().await else {
                        return;
                    };
                    let handshake: Value = serde_json::from_str(&text).unwrap();
                    let id = handshake["subscriptionId"].as_i64().unwrap();

                    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<String>();
                    registry.lock().unwrap().insert(id, frame_tx);
                    let _ = handshake_tx.send(handshake);

                    loop {
                        tokio::select! {
                            frame = frame_rx.recv() => match frame {
                                Some(frame) => {
                                    if ws.send(Message::Text(frame)).await.is_err() {
                                        break;
                                    }
                                }
                                None => break,
                            },
                            incoming = ws.next() => match incoming {
                                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                                Some(Ok(_)) => {}
                            },
                        }
                    }
                    registry.lock().unwrap().remove(&id);
                });
            }
        });

        Arc::new(Self {
            addr,
            handshakes: tokio::sync::Mutex::new(handshake_rx),
            connections,
        })
    }

    pub fn url_for(&self, id: i64) -> String {
        format!("ws://{}/events/{}", self.addr, id)
    }

    /// Next handshake message received by the hub
    pub async fn next_handshake(&self) -> Value {
        tokio::time::timeout(Duration::from_secs(5), self.handshakes.lock().await.recv())
            .await
            .expect("no handshake within 5s")
            .expect("hub stopped")
    }

    pub fn push(&self, id: i64, event: Value) -> bool {
        self.push_raw(id, &event.to_string())
    }

    /// Push a text frame as-is, decodable or not
    pub fn push_raw(&self, id: i64, frame: &str) -> bool {
        match self.connections.lock().unwrap().get(&id) {
            Some(tx) => tx.send(frame.to_string()).is_ok(),
            None => false,
        }
    }

    pub fn open_connections(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Poll until the hub sees `expected` open connections
    pub async fn wait_for_connections(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.open_connections() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "expected {} open connections, hub has {}",
                expected,
                self.open_connections()
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

/// Scriptable in-memory actor server behind the RPC transport seam
pub struct FakeActorServer {
    hub: Arc<EventHub>,
    next_id: AtomicI64,
    fixed_id: Option<i64>,
    unreachable_events: bool,
    failing_unsubscribes: Mutex<HashSet<i64>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl FakeActorServer {
    pub fn new(hub: Arc<EventHub>, first_id: i64) -> Self {
        Self {
            hub,
            next_id: AtomicI64::new(first_id),
            fixed_id: None,
            unreachable_events: false,
            failing_unsubscribes: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Hand out the same subscription id for every subscribe
    pub fn with_fixed_id(mut self, id: i64) -> Self {
        self.fixed_id = Some(id);
        self
    }

    /// Advertise an event url nothing listens on
    pub fn with_unreachable_events(mut self) -> Self {
        self.unreachable_events = true;
        self
    }

    pub fn fail_unsubscribe(&self, id: i64) {
        self.failing_unsubscribes.lock().unwrap().insert(id);
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params)
            .collect()
    }

    fn reply(&self, method: &str, params: &[Value]) -> Value {
        match method {
            "api.subscribe" => {
                let id = self
                    .fixed_id
                    .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst));
                let url = if self.unreachable_events {
                    "ws://127.0.0.1:1/events".to_string()
                } else {
                    self.hub.url_for(id)
                };
                json!({"status": "ok", "result": {"subscriptionId": id, "url": url}})
            }
            "api.unsubscribe" => {
                let id = params.first().and_then(Value::as_i64).unwrap_or_default();
                if self.failing_unsubscribes.lock().unwrap().contains(&id) {
                    json!({"status": "error", "message": format!("unknown subscription {}", id)})
                } else {
                    json!({"status": "ok"})
                }
            }
            "api.getNames" => json!({"status": "ok", "result": ["printer"]}),
            _ => json!({"status": "ok"}),
        }
    }
}

#[async_trait]
impl RpcTransport for FakeActorServer {
    async fn call(&self, method: &str, params: Vec<Value>) -> BridgeResult<Value> {
        let reply = self.reply(method, &params);
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        Ok(reply)
    }
}

pub fn event(source: &str, event_type: &str) -> Value {
    json!({
        "source": source,
        "eventType": event_type,
        "message": {"senderName": "tester", "body": "ping"},
        "messageClass": "Ping"
    })
}
