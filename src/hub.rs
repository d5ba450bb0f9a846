//! Entry points for the UI layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::config::Settings;
use crate::danmaku::{ChatFeed, DanmakuMessage, DanmakuPipeline};
use crate::error::AppResult;
use crate::external::backend::{DanmakuBackend, LiveBackend, ProxyRelay};
use crate::external::events::DanmakuEventSource;
use crate::external::live::{AdapterRegistry, CommonStreamer, LivePlatform};
use crate::follow::{FollowRefreshScheduler, FollowRepository, FollowStore, FollowedStreamer};
use crate::pager::RoomListPager;
use crate::playback::{PlaybackSource, ProxySession, RetryPolicy, StreamController};
use crate::session::{BackendTokenProvider, SessionTokenProvider};

/// External services the hub drives.
#[derive(Clone)]
pub struct Collaborators {
    pub live: Arc<dyn LiveBackend>,
    pub proxy: Arc<dyn ProxyRelay>,
    pub danmaku: Arc<dyn DanmakuBackend>,
    pub events: Arc<dyn DanmakuEventSource>,
    pub follows: Arc<dyn FollowRepository>,
}

/// One pager per platform, one playback controller, at most one chat feed
/// and the follow list.
pub struct LiveHub {
    pagers: HashMap<LivePlatform, Arc<RoomListPager>>,
    streams: Arc<StreamController>,
    retry: RetryPolicy,
    danmaku: DanmakuPipeline,
    chat: Mutex<Option<ChatFeed>>,
    /// Cancelled feeds whose listener stop may still be in flight
    leaving: Mutex<Vec<ChatFeed>>,
    follows: Arc<FollowStore>,
    refresh_cron: String,
}

impl LiveHub {
    pub fn new(collaborators: Collaborators, settings: &Settings) -> Self {
        let adapters = AdapterRegistry::from_config(collaborators.live.clone(), &settings.pager);
        let tokens: Arc<dyn SessionTokenProvider> =
            Arc::new(BackendTokenProvider::new(collaborators.live.clone()));

        let pagers = adapters
            .platforms()
            .into_iter()
            .filter_map(|platform| adapters.get(platform))
            .map(|adapter| {
                let platform = adapter.platform();
                (platform, Arc::new(RoomListPager::new(adapter, tokens.clone())))
            })
            .collect();

        let proxy = Arc::new(ProxySession::new(collaborators.proxy));
        let streams = Arc::new(StreamController::with_config(
            adapters.clone(),
            proxy,
            &settings.playback,
        ));

        Self {
            pagers,
            streams,
            retry: RetryPolicy::from(&settings.playback),
            danmaku: DanmakuPipeline::with_config(
                collaborators.danmaku,
                collaborators.events,
                &settings.danmaku,
            ),
            chat: Mutex::new(None),
            leaving: Mutex::new(Vec::new()),
            follows: Arc::new(FollowStore::new(collaborators.follows, adapters)),
            refresh_cron: settings.follows.refresh_cron.clone(),
        }
    }

    pub fn platforms(&self) -> Vec<LivePlatform> {
        let mut platforms: Vec<_> = self.pagers.keys().copied().collect();
        platforms.sort();
        platforms
    }

    /// Room list for `platform`. The same pager is returned on every call.
    pub fn pager(&self, platform: LivePlatform) -> Option<Arc<RoomListPager>> {
        self.pagers.get(&platform).cloned()
    }

    // ------------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------------

    /// Resolves the room and points the relay at it. Transient failures are
    /// retried per the configured policy.
    pub async fn resolve_and_play(
        &self,
        platform: LivePlatform,
        room_id: &str,
        quality: Option<&str>,
    ) -> AppResult<PlaybackSource> {
        self.streams
            .resolve_with_retry(platform, room_id, quality, self.retry)
            .await
    }

    pub async fn stop_playback(&self) {
        self.streams.stop().await;
    }

    pub fn streams(&self) -> &Arc<StreamController> {
        &self.streams
    }

    // ------------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------------

    /// Stops the current chat feed, if any, then starts one for `room_id`.
    /// The receiver always holds the current message buffer.
    ///
    /// Listeners of rooms left earlier are stopped before the new one starts.
    pub async fn start_chat(
        &self,
        platform: LivePlatform,
        room_id: &str,
    ) -> AppResult<watch::Receiver<Vec<DanmakuMessage>>> {
        self.finish_leaving().await;
        if let Some(previous) = self.take_chat() {
            previous.shutdown().await;
        }

        let session = self.danmaku.start(platform, room_id).await?;
        let feed = ChatFeed::spawn(session);
        let receiver = feed.subscribe();

        // a concurrent start may have won the slot meanwhile
        let replaced = self.chat_slot().replace(feed);
        if let Some(replaced) = replaced {
            self.defer_shutdown(replaced);
        }
        Ok(receiver)
    }

    pub async fn stop_chat(&self) {
        self.finish_leaving().await;
        if let Some(feed) = self.take_chat() {
            feed.shutdown().await;
        }
    }

    /// Current chat room, if a feed is running.
    pub fn chat_room(&self) -> Option<(LivePlatform, String)> {
        self.chat_slot()
            .as_ref()
            .map(|feed| (feed.platform(), feed.room_id().to_string()))
    }

    /// Requests chat and playback teardown and returns without waiting for
    /// either. Must be called from within a Tokio runtime.
    ///
    /// Both teardowns apply to the room being left only. A stream resolved
    /// or a chat started afterwards is never stopped by them.
    pub fn leave_room(&self) {
        if let Some(feed) = self.take_chat() {
            self.defer_shutdown(feed);
        }

        // claimed now so that only a later resolution can outrank it
        let ticket = self.streams.release();
        let streams = Arc::clone(&self.streams);
        tokio::spawn(async move {
            if !streams.stop_for(ticket).await {
                tracing::debug!("Relay left running for the next room");
            }
        });
    }

    fn chat_slot(&self) -> MutexGuard<'_, Option<ChatFeed>> {
        self.chat.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_chat(&self) -> Option<ChatFeed> {
        self.chat_slot().take()
    }

    fn leaving_slot(&self) -> MutexGuard<'_, Vec<ChatFeed>> {
        self.leaving.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn defer_shutdown(&self, feed: ChatFeed) {
        feed.cancel();
        self.leaving_slot().push(feed);
    }

    async fn finish_leaving(&self) {
        let leaving = std::mem::take(&mut *self.leaving_slot());
        for feed in leaving {
            feed.shutdown().await;
        }
    }

    // ------------------------------------------------------------------------
    // Follows
    // ------------------------------------------------------------------------

    pub fn follows(&self) -> &Arc<FollowStore> {
        &self.follows
    }

    /// Follows a room picked from a browse list.
    pub async fn follow_room(&self, streamer: &CommonStreamer) -> bool {
        self.follows
            .follow(FollowedStreamer::from_streamer(streamer))
            .await
    }

    /// Creates and starts the periodic follow refresh.
    pub async fn start_follow_refresh(&self) -> AppResult<FollowRefreshScheduler> {
        let scheduler =
            FollowRefreshScheduler::new(Arc::clone(&self.follows), &self.refresh_cron).await?;
        scheduler.start().await?;
        Ok(scheduler)
    }
}
