use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;

use super::buffer::BoundedBuffer;
use super::message::DanmakuMessage;
use super::parser::{channel_name, parse};
use crate::config::DanmakuConfig;
use crate::error::{AppError, AppResult};
use crate::external::backend::DanmakuBackend;
use crate::external::events::{DanmakuEventSource, EventSubscription};
use crate::external::live::LivePlatform;

/// Starts chat listeners and hands out their sessions.
pub struct DanmakuPipeline {
    backend: Arc<dyn DanmakuBackend>,
    events: Arc<dyn DanmakuEventSource>,
    capacity: usize,
}

impl DanmakuPipeline {
    pub fn new(backend: Arc<dyn DanmakuBackend>, events: Arc<dyn DanmakuEventSource>) -> Self {
        Self::with_config(backend, events, &DanmakuConfig::default())
    }

    pub fn with_config(
        backend: Arc<dyn DanmakuBackend>,
        events: Arc<dyn DanmakuEventSource>,
        config: &DanmakuConfig,
    ) -> Self {
        Self {
            backend,
            events,
            capacity: config.buffer_capacity,
        }
    }

    /// Asks the backend to listen to `room_id`, then subscribes to the
    /// room's channel.
    pub async fn start(&self, platform: LivePlatform, room_id: &str) -> AppResult<DanmakuSession> {
        self.backend
            .start_listener(platform, room_id)
            .await
            .map_err(|e| AppError::AdapterFetch {
                platform,
                message: format!("failed to start chat listener: {}", e),
                source: Some(e.into()),
            })?;

        let channel = channel_name(platform, room_id);
        let subscription = match self.events.subscribe(&channel).await {
            Ok(subscription) => subscription,
            Err(e) => {
                if let Err(stop_err) = self.backend.stop_listener(platform, room_id).await {
                    tracing::warn!(%platform, room_id, error = %stop_err, "Failed to stop orphaned chat listener");
                }
                return Err(AppError::AdapterFetch {
                    platform,
                    message: format!("failed to subscribe to {}: {}", channel, e),
                    source: Some(e.into()),
                });
            }
        };

        tracing::info!(%platform, room_id, channel = %channel, "Chat session started");
        Ok(DanmakuSession {
            platform,
            room_id: room_id.to_string(),
            subscription: Some(subscription),
            buffer: BoundedBuffer::new(self.capacity),
            backend: self.backend.clone(),
        })
    }
}

/// One room's chat feed.
///
/// Messages are pulled with [`next`](Self::next); each accepted message is
/// also kept in a bounded buffer readable through [`messages`](Self::messages).
pub struct DanmakuSession {
    platform: LivePlatform,
    room_id: String,
    subscription: Option<EventSubscription>,
    buffer: BoundedBuffer<DanmakuMessage>,
    backend: Arc<dyn DanmakuBackend>,
}

impl DanmakuSession {
    pub fn platform(&self) -> LivePlatform {
        self.platform
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Next message for this room. Returns `None` once stopped or when the
    /// channel closes.
    pub async fn next(&mut self) -> Option<DanmakuMessage> {
        loop {
            let payload = self.subscription.as_mut()?.recv().await?;
            if let Some(message) = self.accept(&payload) {
                self.buffer.push(message.clone());
                return Some(message);
            }
        }
    }

    fn accept(&self, payload: &Value) -> Option<DanmakuMessage> {
        let message = parse(self.platform, payload)?.finish(self.platform, &self.room_id)?;
        if message.room_id != self.room_id {
            tracing::trace!(
                platform = %self.platform,
                expected = %self.room_id,
                received = %message.room_id,
                "Dropping chat message for another room"
            );
            return None;
        }
        Some(message)
    }

    /// Buffered messages, oldest first.
    pub fn messages(&self) -> Vec<DanmakuMessage> {
        self.buffer.snapshot()
    }

    pub fn buffer(&self) -> &BoundedBuffer<DanmakuMessage> {
        &self.buffer
    }

    /// Unsubscribes, then asks the backend to stop listening. Failures are
    /// logged. Calling it again does nothing.
    pub async fn stop(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        drop(subscription);

        match self.backend.stop_listener(self.platform, &self.room_id).await {
            Ok(()) => tracing::info!(platform = %self.platform, room_id = %self.room_id, "Chat session stopped"),
            Err(e) => tracing::warn!(
                platform = %self.platform,
                room_id = %self.room_id,
                error = %e,
                "Failed to stop chat listener"
            ),
        }
    }

    /// Consumes the session as a message stream. The backend listener is not
    /// stopped when the stream is dropped.
    pub fn into_stream(self) -> BoxStream<'static, DanmakuMessage> {
        stream::unfold(self, |mut session| async move {
            session.next().await.map(|message| (message, session))
        })
        .boxed()
    }
}

impl std::fmt::Debug for DanmakuSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DanmakuSession")
            .field("platform", &self.platform)
            .field("room_id", &self.room_id)
            .field("active", &self.is_active())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::danmaku::message::DanmakuKind;
    use crate::external::events::EventBus;
    use crate::test_support::FakeDanmakuBackend;
    use serde_json::json;

    struct Fixture {
        backend: Arc<FakeDanmakuBackend>,
        bus: Arc<EventBus>,
        pipeline: DanmakuPipeline,
    }

    fn fixture(capacity: usize) -> Fixture {
        let backend = Arc::new(FakeDanmakuBackend::new());
        let bus = Arc::new(EventBus::new());
        let pipeline = DanmakuPipeline::with_config(
            backend.clone(),
            bus.clone(),
            &DanmakuConfig {
                buffer_capacity: capacity,
            },
        );
        Fixture {
            backend,
            bus,
            pipeline,
        }
    }

    fn douyu_chat(room: &str, content: &str) -> Value {
        json!({"type": "chatmsg", "room_id": room, "nickname": "n", "content": content, "level": 1})
    }

    #[tokio::test]
    async fn test_start_then_receive() {
        let f = fixture(200);
        let mut session = f.pipeline.start(LivePlatform::Douyu, "9999").await.unwrap();
        assert_eq!(f.backend.calls(), vec!["start:douyu:9999"]);
        assert_eq!(f.bus.subscriber_count("danmaku-9999"), 1);

        f.bus.publish("danmaku-9999", douyu_chat("9999", "hello"));
        let message = session.next().await.unwrap();
        assert_eq!(message.content, "hello");
        assert_eq!(message.kind, DanmakuKind::Chat);
        assert_eq!(session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_other_rooms_and_unknown_types_are_dropped() {
        let f = fixture(200);
        let mut session = f.pipeline.start(LivePlatform::Douyin, "7376").await.unwrap();

        f.bus.publish("danmaku-message", json!({"room_id": "1111", "user": "a", "content": "stale"}));
        f.bus.publish("danmaku-message", json!({"method": "WebcastGiftMessage", "room_id": "7376"}));
        f.bus.publish("danmaku-message", json!({"user": "b", "content": "no room id"}));
        f.bus.publish("danmaku-message", json!({"room_id": "7376", "user": "c", "content": "mine"}));

        let first = session.next().await.unwrap();
        assert_eq!(first.content, "no room id");
        assert_eq!(first.room_id, "7376");
        let second = session.next().await.unwrap();
        assert_eq!(second.content, "mine");
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_buffer_keeps_last_messages() {
        let f = fixture(200);
        let mut session = f.pipeline.start(LivePlatform::Douyu, "9999").await.unwrap();
        for i in 0..250 {
            f.bus.publish("danmaku-9999", douyu_chat("9999", &i.to_string()));
        }
        for _ in 0..250 {
            session.next().await.unwrap();
        }

        let contents: Vec<String> = session.messages().into_iter().map(|m| m.content).collect();
        let expected: Vec<String> = (50..250).map(|i| i.to_string()).collect();
        assert_eq!(contents, expected);
    }

    #[tokio::test]
    async fn test_stop_unsubscribes_before_backend_stop() {
        let f = fixture(200);
        f.backend.observe(f.bus.clone(), "danmaku-9999");
        let mut session = f.pipeline.start(LivePlatform::Douyu, "9999").await.unwrap();

        session.stop().await;
        assert_eq!(f.backend.subscribers_at_stop(), vec![0]);
        assert_eq!(f.backend.calls(), vec!["start:douyu:9999", "stop:douyu:9999"]);
        assert!(!session.is_active());
        assert!(session.next().await.is_none());

        session.stop().await;
        assert_eq!(f.backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_failure_is_swallowed() {
        let f = fixture(200);
        f.backend.fail_stop(true);
        let mut session = f.pipeline.start(LivePlatform::Huya, "660000").await.unwrap();
        session.stop().await;
        assert!(!session.is_active());
        assert_eq!(f.bus.subscriber_count("danmaku-message"), 0);
    }

    #[tokio::test]
    async fn test_start_failure_does_not_subscribe() {
        let f = fixture(200);
        f.backend.fail_start(true);
        let err = f.pipeline.start(LivePlatform::Douyu, "9999").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::AdapterFetch {
                platform: LivePlatform::Douyu,
                ..
            }
        ));
        assert_eq!(f.bus.subscriber_count("danmaku-9999"), 0);
    }

    #[tokio::test]
    async fn test_into_stream() {
        let f = fixture(200);
        let session = f.pipeline.start(LivePlatform::Huya, "660000").await.unwrap();
        f.bus.publish(
            "danmaku-message",
            json!({"type": "enter", "room_id": "660000", "nickname": "x"}),
        );
        f.bus.publish(
            "danmaku-message",
            json!({"type": "chat", "room_id": "660000", "nickname": "y", "content": "z"}),
        );

        let messages: Vec<_> = session.into_stream().take(2).collect().await;
        assert_eq!(messages[0].kind, DanmakuKind::Enter);
        assert_eq!(messages[1].content, "z");
    }
}
