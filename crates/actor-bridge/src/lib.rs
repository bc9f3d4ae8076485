//! # Actor Bridge
//!
//! Client-side access to remote actors. Commands travel over JSON-RPC or
//! XML-RPC (chosen by the endpoint's path suffix), events arrive over a
//! per-subscription WebSocket channel, and [`ActorProxy`] ties the two
//! together per actor.
//!
//! ```no_run
//! use std::sync::Arc;
//! use actor_bridge::{ActorApi, ActorEventType, ActorProxy, EventListener};
//!
//! # async fn demo() -> actor_bridge::BridgeResult<()> {
//! let api = Arc::new(ActorApi::from_url("http://localhost:8080/jsonrpc")?);
//! api.spawn_actor("printer", "PrinterActor").await?;
//!
//! let printer = ActorProxy::new("printer", api.clone());
//! let listener = EventListener::new(|event| println!("{}", event.describe()));
//! printer.add_event_listener(ActorEventType::MessageReceived, listener.clone()).await?;
//! printer.send(serde_json::json!("hello")).await?;
//!
//! printer.remove_event_listener(&listener).await?;
//! api.shutdown().await
//! # }
//! ```

pub mod api;
pub mod channel;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod proxy;
pub mod rpc;
pub mod transport;

pub use api::ActorApi;
pub use channel::{ChannelState, EventChannel};
pub use config::{ClientConfig, TransportKind};
pub use error::{BridgeError, BridgeResult};
pub use events::{ActorEvent, ActorEventMessage, ActorEventType, EventListener, EventSelection};
pub use proxy::ActorProxy;
pub use rpc::{RpcApi, RpcResponse, SubscribeResult, SubscriptionId};
pub use transport::{JsonRpcTransport, RpcTransport, XmlRpcTransport};
