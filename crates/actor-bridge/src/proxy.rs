use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::ActorApi;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{EventListener, EventSelection, ListenerId};
use crate::rpc::SubscriptionId;

/// Per-actor handle that keys subscriptions by listener instead of by id
#[derive(Debug)]
pub struct ActorProxy {
    actor_name: String,
    api: Arc<ActorApi>,
    /// Subscription held for each registered listener
    registrations: Mutex<HashMap<ListenerId, SubscriptionId>>,
}

impl ActorProxy {
    pub fn new(actor_name: impl Into<String>, api: Arc<ActorApi>) -> Self {
        Self {
            actor_name: actor_name.into(),
            api,
            registrations: Mutex::new(HashMap::new()),
        }
    }

    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    /// Send a single value with no message class
    pub async fn send(&self, message_body: Value) -> BridgeResult<()> {
        self.api.send(&self.actor_name, message_body, None).await
    }

    pub async fn send_with_class(&self, message_args: Value, message_class: &str) -> BridgeResult<()> {
        self.api
            .send(&self.actor_name, message_args, Some(message_class))
            .await
    }

    /// Receive the next message, waiting as long as the server allows
    pub async fn receive(&self) -> BridgeResult<Value> {
        self.api.receive(&self.actor_name, None).await
    }

    pub async fn receive_timeout(&self, timeout_ms: u64) -> BridgeResult<Value> {
        self.api.receive(&self.actor_name, Some(timeout_ms)).await
    }

    /// Subscribe `listener` to `events` of this actor.
    ///
    /// A listener can be registered once per proxy. If the server hands back
    /// a subscription id this proxy already tracks, the new subscription is
    /// released immediately and [`BridgeError::DuplicateSubscription`] is
    /// returned; the stale registration for that id is dropped as well since
    /// its channel has been superseded.
    pub async fn add_event_listener(
        &self,
        events: impl Into<EventSelection>,
        listener: EventListener,
    ) -> BridgeResult<SubscriptionId> {
        let listener_id = listener.id();
        if self.registrations.lock().await.contains_key(&listener_id) {
            return Err(self.already_registered());
        }

        let kinds = events.into().into_kinds();
        let subscription_id = self
            .api
            .subscribe(&kinds, &[self.actor_name.clone()], listener)
            .await?;

        let conflict = {
            let mut registrations = self.registrations.lock().await;
            if registrations.contains_key(&listener_id) {
                Some(self.already_registered())
            } else if registrations.values().any(|id| *id == subscription_id) {
                registrations.retain(|_, id| *id != subscription_id);
                Some(BridgeError::DuplicateSubscription {
                    id: subscription_id,
                })
            } else {
                registrations.insert(listener_id, subscription_id);
                None
            }
        };

        if let Some(err) = conflict {
            if let Err(e) = self.api.unsubscribe(subscription_id).await {
                warn!(
                    "Releasing conflicting subscription {} on {} failed: {}",
                    subscription_id, self.actor_name, e
                );
            }
            return Err(err);
        }

        debug!(
            "Listener added on {} with subscription {}",
            self.actor_name, subscription_id
        );
        Ok(subscription_id)
    }

    /// Unsubscribe `listener` if this proxy tracks it; otherwise do nothing
    pub async fn remove_event_listener(&self, listener: &EventListener) -> BridgeResult<()> {
        let subscription_id = self.registrations.lock().await.remove(&listener.id());
        match subscription_id {
            Some(subscription_id) => {
                debug!(
                    "Removing listener on {} (subscription {})",
                    self.actor_name, subscription_id
                );
                self.api.unsubscribe(subscription_id).await
            }
            None => Ok(()),
        }
    }

    /// Release every registration, attempting all of them even after a failure
    pub async fn remove_all_event_listeners(&self) -> BridgeResult<()> {
        let subscription_ids: Vec<_> = self
            .registrations
            .lock()
            .await
            .drain()
            .map(|(_, id)| id)
            .collect();

        let mut failures = 0;
        let mut last = None;
        for subscription_id in subscription_ids {
            if let Err(e) = self.api.unsubscribe(subscription_id).await {
                warn!(
                    "Failed to unsubscribe {} on {}: {}",
                    subscription_id, self.actor_name, e
                );
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

    pub async fn listener_count(&self) -> usize {
        self.registrations.lock().await.len()
    }

    pub async fn has_listener(&self, listener: &EventListener) -> bool {
        self.registrations.lock().await.contains_key(&listener.id())
    }

    pub async fn subscription_ids(&self) -> Vec<SubscriptionId> {
        let mut ids: Vec<_> = self
            .registrations
            .lock()
            .await
            .values()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    fn already_registered(&self) -> BridgeError {
        BridgeError::ListenerAlreadyRegistered {
            actor: self.actor_name.clone(),
        }
    }
}

impl Drop for ActorProxy {
    fn drop(&mut self) {
        let leftover: Vec<_> = self
            .registrations
            .get_mut()
            .drain()
            .map(|(_, id)| id)
            .collect();
        if leftover.is_empty() {
            return;
        }

        warn!(
            "Proxy for {} dropped with {} live listener(s)",
            self.actor_name,
            leftover.len()
        );
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let api = self.api.clone();
                handle.spawn(async move {
                    for subscription_id in leftover {
                        if let Err(e) = api.unsubscribe(subscription_id).await {
                            warn!("Deferred unsubscribe of {} failed: {}", subscription_id, e);
                        }
                    }
                });
            }
            Err(_) => warn!(
                "No runtime available, subscriptions {:?} were not released",
                leftover
            ),
        }
    }
}
