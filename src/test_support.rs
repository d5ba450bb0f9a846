//! In-memory collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::error::{AppError, AppResult};
use crate::external::backend::{
    BackendError, BackendErrorKind, BackendResult, DanmakuBackend, ListRoomsRequest, LiveBackend,
    ProxyRelay,
};
use crate::external::events::EventBus;
use crate::external::live::LivePlatform;
use crate::follow::{FollowRepository, FollowedStreamer};

pub const FAKE_PROXY_URL: &str = "http://127.0.0.1:34719/live.flv";

/// Held by every test that reads or writes `LIVEHUB_*` variables, which are
/// process-wide.
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Scripted [`LiveBackend`]. List responses are consumed in order; stream
/// responses come from the per-room table first, then the queue, then the
/// fixed response.
#[derive(Default)]
pub struct FakeBackend {
    token: Mutex<Option<BackendResult<String>>>,
    token_calls: AtomicUsize,
    lists: Mutex<VecDeque<BackendResult<Value>>>,
    list_requests: Mutex<Vec<ListRoomsRequest>>,
    list_gate: Mutex<Option<Arc<Semaphore>>>,
    queued_streams: Mutex<VecDeque<BackendResult<Value>>>,
    stream: Mutex<Option<BackendResult<Value>>>,
    room_streams: Mutex<HashMap<String, BackendResult<Value>>>,
    stream_gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    stream_calls: AtomicUsize,
    statuses: Mutex<HashMap<String, BackendResult<Value>>>,
    status_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: BackendResult<String>) {
        *self.token.lock().unwrap() = Some(token);
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn push_list(&self, response: BackendResult<Value>) {
        self.lists.lock().unwrap().push_back(response);
    }

    pub fn list_requests(&self) -> Vec<ListRoomsRequest> {
        self.list_requests.lock().unwrap().clone()
    }

    /// Holds every list call after it is recorded until a permit is added.
    pub fn gate_lists(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Yields until at least `count` list calls have been recorded.
    pub async fn wait_for_list_calls(&self, count: usize) {
        while self.list_requests.lock().unwrap().len() < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn set_stream(&self, response: BackendResult<Value>) {
        *self.stream.lock().unwrap() = Some(response);
    }

    pub fn push_stream(&self, response: BackendResult<Value>) {
        self.queued_streams.lock().unwrap().push_back(response);
    }

    pub fn set_room_stream(&self, room_id: &str, response: BackendResult<Value>) {
        self.room_streams
            .lock()
            .unwrap()
            .insert(room_id.to_string(), response);
    }

    /// Holds stream calls for `room_id` after they are counted until a
    /// permit is added.
    pub fn gate_stream(&self, room_id: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.stream_gates
            .lock()
            .unwrap()
            .insert(room_id.to_string(), gate.clone());
        gate
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Yields until at least `count` stream calls have been counted.
    pub async fn wait_for_stream_calls(&self, count: usize) {
        while self.stream_calls() < count {
            tokio::task::yield_now().await;
        }
    }

    pub fn set_status(&self, room_id: &str, response: BackendResult<Value>) {
        self.statuses
            .lock()
            .unwrap()
            .insert(room_id.to_string(), response);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiveBackend for FakeBackend {
    async fn acquire_session_token(&self, _platform: LivePlatform) -> BackendResult<String> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.token
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok("fake-token".to_string()))
    }

    async fn list_rooms(&self, request: &ListRoomsRequest) -> BackendResult<Value> {
        self.list_requests.lock().unwrap().push(request.clone());
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::other("no list response queued")))
    }

    async fn resolve_stream(
        &self,
        _platform: LivePlatform,
        room_id: &str,
        _quality: &str,
    ) -> BackendResult<Value> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.stream_gates.lock().unwrap().get(room_id).cloned();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(response) = self.room_streams.lock().unwrap().get(room_id) {
            return response.clone();
        }
        if let Some(queued) = self.queued_streams.lock().unwrap().pop_front() {
            return queued;
        }
        self.stream
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(BackendError::other("no stream response configured")))
    }

    async fn room_status(&self, _platform: LivePlatform, room_id: &str) -> BackendResult<Value> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .get(room_id)
            .cloned()
            .unwrap_or_else(|| {
                Err(BackendError::new(
                    BackendErrorKind::RoomNotFound,
                    format!("no status for {room_id}"),
                ))
            })
    }
}

/// Relay that records its targets. `served()` lists the target active at each start.
#[derive(Default)]
pub struct FakeProxyRelay {
    target: Mutex<Option<String>>,
    targets_set: Mutex<Vec<String>>,
    served: Mutex<Vec<String>>,
    stops: AtomicUsize,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
}

impl FakeProxyRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn current_target(&self) -> Option<String> {
        self.target.lock().unwrap().clone()
    }

    pub fn targets_set(&self) -> Vec<String> {
        self.targets_set.lock().unwrap().clone()
    }

    pub fn served(&self) -> Vec<String> {
        self.served.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxyRelay for FakeProxyRelay {
    async fn set_target(&self, upstream_url: &str) -> BackendResult<()> {
        *self.target.lock().unwrap() = Some(upstream_url.to_string());
        self.targets_set
            .lock()
            .unwrap()
            .push(upstream_url.to_string());
        Ok(())
    }

    async fn start(&self) -> BackendResult<String> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::other("address in use"));
        }
        let target = self
            .current_target()
            .ok_or_else(|| BackendError::other("no target set"))?;
        self.served.lock().unwrap().push(target);
        Ok(FAKE_PROXY_URL.to_string())
    }

    async fn stop(&self) -> BackendResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(BackendError::other("proxy already gone"));
        }
        *self.target.lock().unwrap() = None;
        Ok(())
    }
}

/// Danmaku backend that logs `start:`/`stop:` calls and, when observing a
/// bus, the channel's subscriber count at each stop.
#[derive(Default)]
pub struct FakeDanmakuBackend {
    calls: Mutex<Vec<String>>,
    observed: Mutex<Option<(Arc<EventBus>, String)>>,
    subscribers_at_stop: Mutex<Vec<usize>>,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
}

impl FakeDanmakuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, bus: Arc<EventBus>, channel: &str) {
        *self.observed.lock().unwrap() = Some((bus, channel.to_string()));
    }

    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subscribers_at_stop(&self) -> Vec<usize> {
        self.subscribers_at_stop.lock().unwrap().clone()
    }
}

#[async_trait]
impl DanmakuBackend for FakeDanmakuBackend {
    async fn start_listener(&self, platform: LivePlatform, room_id: &str) -> BackendResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("start:{platform}:{room_id}"));
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::other("websocket handshake failed"));
        }
        Ok(())
    }

    async fn stop_listener(&self, platform: LivePlatform, room_id: &str) -> BackendResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("stop:{platform}:{room_id}"));
        if let Some((bus, channel)) = self.observed.lock().unwrap().as_ref() {
            self.subscribers_at_stop
                .lock()
                .unwrap()
                .push(bus.subscriber_count(channel));
        }
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(BackendError::other("listener not running"));
        }
        Ok(())
    }
}

/// Follow repository kept in memory.
#[derive(Default)]
pub struct MemoryFollowRepository {
    stored: Mutex<Vec<FollowedStreamer>>,
    saves: AtomicUsize,
    fail_save: AtomicBool,
}

impl MemoryFollowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<FollowedStreamer>) -> Self {
        Self {
            stored: Mutex::new(items),
            ..Self::default()
        }
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<FollowedStreamer> {
        self.stored.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FollowRepository for MemoryFollowRepository {
    async fn load(&self) -> AppResult<Vec<FollowedStreamer>> {
        Ok(self.stored())
    }

    async fn save(&self, items: &[FollowedStreamer]) -> AppResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AppError::Persistence {
                message: "disk full".to_string(),
                source: None,
            });
        }
        *self.stored.lock().unwrap() = items.to_vec();
        Ok(())
    }
}
