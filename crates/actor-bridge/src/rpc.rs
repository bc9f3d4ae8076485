use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::ActorEventType;
use crate::transport::{self, RpcTransport};

/// Server-assigned id of a push subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(i64);

impl SubscriptionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for SubscriptionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Uniform outcome of every actor operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RpcResponse {
    Ok {
        #[serde(default)]
        result: Value,
    },
    Error {
        message: String,
    },
}

impl RpcResponse {
    fn decode(raw: Value) -> BridgeResult<Self> {
        serde_json::from_value(raw)
            .map_err(|e| BridgeError::protocol(format!("malformed response envelope: {}", e)))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RpcResponse::Ok { .. })
    }

    /// Unwrap the result, turning an error envelope into [`BridgeError::Remote`]
    pub fn into_result(self) -> BridgeResult<Value> {
        match self {
            RpcResponse::Ok { result } => Ok(result),
            RpcResponse::Error { message } => Err(BridgeError::Remote { message }),
        }
    }
}

/// Payload of a successful `api.subscribe`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResult {
    pub subscription_id: SubscriptionId,
    pub url: String,
}

/// Maps each actor operation onto exactly one transport call
#[derive(Clone)]
pub struct RpcApi {
    transport: Arc<dyn RpcTransport>,
}

impl RpcApi {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Build an API over the transport selected by the endpoint URL
    pub fn connect(config: &ClientConfig) -> BridgeResult<Self> {
        Ok(Self::new(transport::connect(config)?))
    }

    async fn invoke(&self, method: &str, params: Vec<Value>) -> BridgeResult<RpcResponse> {
        debug!("Invoking {} with {} param(s)", method, params.len());
        let raw = self.transport.call(method, params).await?;
        RpcResponse::decode(raw)
    }

    pub async fn spawn_actor(&self, actor_name: &str, actor_class: &str) -> BridgeResult<RpcResponse> {
        self.invoke("api.spawnActor", vec![json!(actor_name), json!(actor_class)])
            .await
    }

    pub async fn get_names(&self) -> BridgeResult<RpcResponse> {
        self.invoke("api.getNames", vec![]).await
    }

    pub async fn subscribe(
        &self,
        event_types: &[ActorEventType],
        actor_names: &[String],
    ) -> BridgeResult<RpcResponse> {
        self.invoke("api.subscribe", vec![json!(event_types), json!(actor_names)])
            .await
    }

    pub async fn unsubscribe(&self, subscription_id: SubscriptionId) -> BridgeResult<RpcResponse> {
        self.invoke("api.unsubscribe", vec![json!(subscription_id)])
            .await
    }

    /// Send a message to an actor.
    ///
    /// With a message class the arguments travel as a list, a single value
    /// being wrapped. Without one they must be a single value; a list is
    /// rejected before anything goes on the wire.
    pub async fn send(
        &self,
        actor_name: &str,
        message_args: Value,
        message_class: Option<&str>,
    ) -> BridgeResult<RpcResponse> {
        let params = match message_class {
            Some(class) => {
                let args = match message_args {
                    Value::Array(items) => items,
                    single => vec![single],
                };
                vec![json!(actor_name), json!(class), Value::Array(args)]
            }
            None => {
                if message_args.is_array() {
                    return Err(BridgeError::contract_violation(
                        "message arguments must be a single value when no message class is given",
                    ));
                }
                vec![json!(actor_name), message_args]
            }
        };
        self.invoke("api.send", params).await
    }

    /// Receive a message; `None` leaves the timeout off the call entirely
    pub async fn receive(&self, actor_name: &str, timeout_ms: Option<u64>) -> BridgeResult<RpcResponse> {
        let mut params = vec![json!(actor_name)];
        if let Some(timeout) = timeout_ms {
            params.push(json!(timeout));
        }
        self.invoke("api.receive", params).await
    }
}

impl fmt::Debug for RpcApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcApi").finish_non_exhaustive()
    }
}
