use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::channel::{ChannelState, EventChannel};
use crate::config::ClientConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{ActorEventType, EventListener};
use crate::rpc::{RpcApi, RpcResponse, SubscribeResult, SubscriptionId};

/// Consumer entry point: typed results in, errors out, no envelopes.
///
/// Owns one [`EventChannel`] per live subscription. Construct it once, share
/// it behind an `Arc`, and call [`ActorApi::shutdown`] when done.
#[derive(Debug)]
pub struct ActorApi {
    rpc: RpcApi,
    channels: Mutex<HashMap<SubscriptionId, EventChannel>>,
}

fn decode<T: DeserializeOwned>(operation: &str, value: Value) -> BridgeResult<T> {
    serde_json::from_value(value).map_err(|e| {
        BridgeError::protocol(format!("unexpected result for {}: {}", operation, e))
    })
}

impl ActorApi {
    pub fn new(rpc: RpcApi) -> Self {
        Self {
            rpc,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Create an API for `config.endpoint`, picking the transport from its path suffix
    pub fn connect(config: &ClientConfig) -> BridgeResult<Self> {
        Ok(Self::new(RpcApi::connect(config)?))
    }

    pub fn from_url(url: &str) -> BridgeResult<Self> {
        Self::connect(&ClientConfig::new(url))
    }

    pub async fn spawn_actor(&self, actor_name: &str, actor_class: &str) -> BridgeResult<()> {
        self.rpc
            .spawn_actor(actor_name, actor_class)
            .await?
            .into_result()?;
        info!("Spawned actor {} ({})", actor_name, actor_class);
        Ok(())
    }

    pub async fn get_names(&self) -> BridgeResult<Vec<String>> {
        let result = self.rpc.get_names().await?.into_result()?;
        decode("api.getNames", result)
    }

    /// Subscribe to `event_types` of `actor_names` (all actors when empty).
    ///
    /// Opens exactly one event channel for the confirmed subscription. If the
    /// result has no usable url, or the channel cannot be opened, the remote
    /// subscription is released again.
    pub async fn subscribe(
        &self,
        event_types: &[ActorEventType],
        actor_names: &[String],
        listener: EventListener,
    ) -> BridgeResult<SubscriptionId> {
        let result = self
            .rpc
            .subscribe(event_types, actor_names)
            .await?
            .into_result()?;
        let confirmed = result
            .get("subscriptionId")
            .and_then(Value::as_i64)
            .map(SubscriptionId::new);
        let SubscribeResult {
            subscription_id,
            url,
        } = match decode("api.subscribe", result) {
            Ok(decoded) => decoded,
            Err(e) => {
                if let Some(id) = confirmed {
                    warn!("Subscription {} came back without a usable url", id);
                    self.release(id).await;
                }
                return Err(e);
            }
        };

        let channel = match EventChannel::open(&url, subscription_id, listener).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(
                    "Could not open event channel for subscription {}: {}",
                    subscription_id, e
                );
                self.release(subscription_id).await;
                return Err(e);
            }
        };

        let mut channels = self.channels.lock().await;
        if let Some(superseded) = channels.insert(subscription_id, channel) {
            warn!(
                "Server reused live subscription id {}, closing the previous channel",
                subscription_id
            );
            superseded.close();
        }
        debug!(
            "Subscribed to {:?} for {:?} as {}",
            event_types, actor_names, subscription_id
        );
        Ok(subscription_id)
    }

    /// Best-effort remote release of a subscription that never got a channel
    async fn release(&self, subscription_id: SubscriptionId) {
        if let Err(e) = self
            .rpc
            .unsubscribe(subscription_id)
            .await
            .and_then(RpcResponse::into_result)
        {
            warn!("Releasing subscription {} failed: {}", subscription_id, e);
        }
    }

    /// Stop local delivery first, then release the subscription remotely.
    ///
    /// The id is forgotten even when the remote call fails.
    pub async fn unsubscribe(&self, subscription_id: SubscriptionId) -> BridgeResult<()> {
        let channel = self.channels.lock().await.remove(&subscription_id);
        match channel {
            Some(channel) => channel.close(),
            None => debug!("No open channel for subscription {}", subscription_id),
        }

        self.rpc
            .unsubscribe(subscription_id)
            .await?
            .into_result()?;
        debug!("Unsubscribed {}", subscription_id);
        Ok(())
    }

    /// Send a message to an actor.
    ///
    /// Without a message class a one-element list is collapsed to its only
    /// value, so `[42]` and `42` go out as the same call. Longer lists still
    /// need a class.
    pub async fn send(
        &self,
        actor_name: &str,
        message_args: Value,
        message_class: Option<&str>,
    ) -> BridgeResult<()> {
        let message_args = match (message_class, message_args) {
            (None, Value::Array(mut items)) if items.len() == 1 => items.remove(0),
            (_, args) => args,
        };
        self.rpc
            .send(actor_name, message_args, message_class)
            .await?
            .into_result()?;
        Ok(())
    }

    pub async fn receive(&self, actor_name: &str, timeout_ms: Option<u64>) -> BridgeResult<Value> {
        self.rpc.receive(actor_name, timeout_ms).await?.into_result()
    }

    /// State updates for a live subscription, `None` once it is gone
    pub async fn subscription_state(
        &self,
        subscription_id: SubscriptionId,
    ) -> Option<watch::Receiver<ChannelState>> {
        self.channels
            .lock()
            .await
            .get(&subscription_id)
            .map(EventChannel::state)
    }

    pub async fn active_subscriptions(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<_> = self.channels.lock().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Close every channel and release every subscription, continuing past failures
    pub async fn shutdown(&self) -> BridgeResult<()> {
        let channels: Vec<_> = self.channels.lock().await.drain().collect();
        info!("Shutting down {} subscription(s)", channels.len());

        let mut failures = 0;
        let mut last = None;
        for (id, channel) in channels {
            channel.close();
            if let Err(e) = self.rpc.unsubscribe(id).await.and_then(RpcResponse::into_result) {
                warn!("Failed to release subscription {} on shutdown: {}", id, e);
                failures += 1;
                last = Some(e);
            }
        }

        match last {
            Some(last) => Err(BridgeError::UnsubscribeFailed {
                failures,
                last: Box::new(last),
            }),
            None => Ok(()),
        }
    }
}
