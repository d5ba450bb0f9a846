use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::backend::BackendResult;

const CHANNEL_CAPACITY: usize = 1024;

/// Live subscription to a push-event channel. Dropping it unsubscribes.
pub struct EventSubscription {
    channel: String,
    events: BoxStream<'static, Value>,
}

impl EventSubscription {
    pub fn new(channel: impl Into<String>, events: BoxStream<'static, Value>) -> Self {
        Self {
            channel: channel.into(),
            events,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next payload, or `None` once the channel is closed.
    pub async fn recv(&mut self) -> Option<Value> {
        self.events.next().await
    }
}

impl std::fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSubscription")
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

/// Source of raw chat payloads pushed by the backend.
#[async_trait]
pub trait DanmakuEventSource: Send + Sync {
    async fn subscribe(&self, channel: &str) -> BackendResult<EventSubscription>;
}

/// In-process broadcast bus keyed by channel name.
///
/// A channel exists only while it has subscribers. Idle channels are dropped
/// on the next subscribe or on a publish nobody receives.
#[derive(Default)]
pub struct EventBus {
    channels: DashMap<String, broadcast::Sender<Value>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn receiver(&self, channel: &str) -> broadcast::Receiver<Value> {
        self.channels
            .retain(|name, sender| name == channel || sender.receiver_count() > 0);
        // subscribing under the entry guard keeps a concurrent prune from
        // dropping the sender before it has a receiver
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes a payload and returns how many subscribers received it.
    pub fn publish(&self, channel: &str, payload: Value) -> usize {
        let Some(sent) = self.channels.get(channel).map(|sender| sender.send(payload)) else {
            return 0;
        };
        match sent {
            Ok(count) => count,
            Err(_) => {
                self.channels
                    .remove_if(channel, |_, sender| sender.receiver_count() == 0);
                0
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DanmakuEventSource for EventBus {
    async fn subscribe(&self, channel: &str) -> BackendResult<EventSubscription> {
        let receiver = self.receiver(channel);
        let name = channel.to_string();
        let events = stream::unfold(receiver, move |mut receiver| {
            let name = name.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(payload) => return Some((payload, receiver)),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(channel = %name, skipped, "Event subscriber lagged");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });
        Ok(EventSubscription::new(channel, events.boxed()))
    }
}
