use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::message::DanmakuMessage;
use super::pipeline::DanmakuSession;
use crate::external::live::LivePlatform;

/// Background task draining a [`DanmakuSession`] into a watch channel that
/// always holds the current buffer.
pub struct ChatFeed {
    platform: LivePlatform,
    room_id: String,
    cancel: CancellationToken,
    messages: watch::Receiver<Vec<DanmakuMessage>>,
    task: JoinHandle<()>,
}

impl ChatFeed {
    pub fn spawn(mut session: DanmakuSession) -> Self {
        let platform = session.platform();
        let room_id = session.room_id().to_string();
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(session.messages());

        let token = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    message = session.next() => match message {
                        Some(_) => {
                            tx.send_replace(session.messages());
                        }
                        None => break,
                    },
                }
            }
            session.stop().await;
        });

        Self {
            platform,
            room_id,
            cancel,
            messages: rx,
            task,
        }
    }

    pub fn platform(&self) -> LivePlatform {
        self.platform
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<DanmakuMessage>> {
        self.messages.clone()
    }

    /// Requests teardown without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Requests teardown and waits until the backend listener was asked to stop.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(
                platform = %self.platform,
                room_id = %self.room_id,
                error = %e,
                "Chat feed task ended abnormally"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::danmaku::DanmakuPipeline;
    use crate::external::events::EventBus;
    use crate::test_support::FakeDanmakuBackend;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_feed_publishes_buffer_and_stops() {
        let backend = Arc::new(FakeDanmakuBackend::new());
        let bus = Arc::new(EventBus::new());
        backend.observe(bus.clone(), "danmaku-9999");
        let pipeline = DanmakuPipeline::new(backend.clone(), bus.clone());

        let session = pipeline.start(LivePlatform::Douyu, "9999").await.unwrap();
        let feed = ChatFeed::spawn(session);
        let mut rx = feed.subscribe();

        bus.publish(
            "danmaku-9999",
            json!({"type": "chatmsg", "room_id": "9999", "nickname": "n", "content": "hi"}),
        );
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);

        feed.shutdown().await;
        assert_eq!(backend.calls(), vec!["start:douyu:9999", "stop:douyu:9999"]);
        assert_eq!(backend.subscribers_at_stop(), vec![0]);
    }
}
