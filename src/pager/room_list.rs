use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::state::{ListState, PagerState};
use crate::error::{AppError, AppResult};
use crate::external::live::{Category, Cursor, LivePlatform, PlatformAdapter, RoomPage};
use crate::session::{SessionToken, SessionTokenProvider};

struct Session {
    /// Bumped on every reset; fetches carrying an older value are discarded
    generation: u64,
    category: Option<Category>,
    cursor: Cursor,
    token: Option<SessionToken>,
    phase: PagerState,
    has_more: bool,
    in_flight: bool,
    cancel: CancellationToken,
}

struct FetchTicket {
    generation: u64,
    cancel: CancellationToken,
}

/// Incrementally growing room list for one platform.
///
/// A category selection starts a new session: the previous fetch is
/// cancelled, items are cleared, the cursor returns to the adapter's initial
/// value and the session token is re-acquired. `load_more` appends the next
/// page and is a no-op unless the list is ready, has more data and nothing is
/// in flight. Failures never retry: a failed reset leaves an empty list and a
/// failed load-more keeps what was already loaded. Both end with
/// `has_more == false`.
pub struct RoomListPager {
    adapter: Arc<dyn PlatformAdapter>,
    tokens: Arc<dyn SessionTokenProvider>,
    session: Mutex<Session>,
    state_tx: watch::Sender<ListState>,
}

impl RoomListPager {
    pub fn new(adapter: Arc<dyn PlatformAdapter>, tokens: Arc<dyn SessionTokenProvider>) -> Self {
        let (state_tx, _) = watch::channel(ListState::idle(adapter.platform()));
        let session = Session {
            generation: 0,
            category: None,
            cursor: adapter.initial_cursor(),
            token: None,
            phase: PagerState::Idle,
            has_more: false,
            in_flight: false,
            cancel: CancellationToken::new(),
        };
        Self {
            adapter,
            tokens,
            session: Mutex::new(session),
            state_tx,
        }
    }

    pub fn platform(&self) -> LivePlatform {
        self.adapter.platform()
    }

    pub fn state(&self) -> ListState {
        self.state_tx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ListState> {
        self.state_tx.subscribe()
    }

    /// Starts a new session for `category` and loads its first page.
    pub async fn select_category(&self, category: Category) -> AppResult<()> {
        let platform = self.platform();
        let ticket = {
            let mut session = self.session();
            session.cancel.cancel();
            session.generation += 1;
            session.cancel = CancellationToken::new();
            session.category = Some(category.clone());
            session.cursor = self.adapter.initial_cursor();
            session.token = None;
            session.phase = PagerState::TokenPending;
            session.has_more = true;
            session.in_flight = true;

            self.state_tx.send_modify(|s| {
                s.category = Some(category.clone());
                s.items.clear();
                s.state = PagerState::TokenPending;
                s.loading = true;
                s.loading_more = false;
                s.has_more = true;
                s.error = None;
            });
            FetchTicket {
                generation: session.generation,
                cancel: session.cancel.clone(),
            }
        };
        tracing::debug!(
            %platform,
            category = %category.id,
            generation = ticket.generation,
            "Room list reset"
        );

        let token = if self.adapter.requires_session_token() {
            let Some(result) = guarded(&ticket, self.tokens.acquire(platform)).await else {
                return Ok(());
            };
            match result {
                Ok(token) => Some(token),
                Err(err) => return self.fail(&ticket, err, true),
            }
        } else {
            None
        };

        let cursor = {
            let mut session = self.session();
            if session.generation != ticket.generation {
                return Ok(());
            }
            session.token = token.clone();
            session.phase = PagerState::Fetching;
            self.state_tx.send_modify(|s| s.state = PagerState::Fetching);
            session.cursor
        };

        let fetch = self.adapter.list_rooms(&category, cursor, token.as_ref());
        let Some(result) = guarded(&ticket, fetch).await else {
            return Ok(());
        };
        match result {
            Ok(page) => {
                self.apply_page(&ticket, page, true);
                Ok(())
            }
            Err(err) => self.fail(&ticket, err, true),
        }
    }

    /// Reloads the current category from its first page.
    pub async fn reset(&self) -> AppResult<()> {
        let category = self.session().category.clone();
        let category = category.ok_or_else(|| AppError::Validation {
            field: "category".to_string(),
            reason: "no category selected".to_string(),
        })?;
        self.select_category(category).await
    }

    /// Appends the next page. Returns `Ok(false)` when nothing was fetched
    /// or the result belonged to a superseded session.
    pub async fn load_more(&self) -> AppResult<bool> {
        let (ticket, category, cursor, token) = {
            let mut session = self.session();
            if session.phase != PagerState::Ready || !session.has_more || session.in_flight {
                return Ok(false);
            }
            let Some(category) = session.category.clone() else {
                return Ok(false);
            };
            session.in_flight = true;
            session.phase = PagerState::Fetching;
            self.state_tx.send_modify(|s| {
                s.state = PagerState::Fetching;
                s.loading_more = true;
            });
            let ticket = FetchTicket {
                generation: session.generation,
                cancel: session.cancel.clone(),
            };
            (ticket, category, session.cursor, session.token.clone())
        };

        let fetch = self.adapter.list_rooms(&category, cursor, token.as_ref());
        let Some(result) = guarded(&ticket, fetch).await else {
            return Ok(false);
        };
        match result {
            Ok(page) => Ok(self.apply_page(&ticket, page, false)),
            Err(err) => self.fail(&ticket, err, false).map(|_| false),
        }
    }

    /// Cancels any in-flight fetch and returns to `Idle` with an empty list.
    pub fn clear(&self) {
        let mut session = self.session();
        session.cancel.cancel();
        session.generation += 1;
        session.cancel = CancellationToken::new();
        session.category = None;
        session.cursor = self.adapter.initial_cursor();
        session.token = None;
        session.phase = PagerState::Idle;
        session.has_more = false;
        session.in_flight = false;
        self.state_tx
            .send_replace(ListState::idle(self.adapter.platform()));
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_page(&self, ticket: &FetchTicket, page: RoomPage, replace: bool) -> bool {
        let mut session = self.session();
        if session.generation != ticket.generation {
            return false;
        }
        let phase = if page.has_more {
            PagerState::Ready
        } else {
            PagerState::Exhausted
        };
        session.cursor = page.next_cursor;
        session.has_more = page.has_more;
        session.in_flight = false;
        session.phase = phase;

        let added = page.items.len();
        self.state_tx.send_modify(|s| {
            if replace {
                s.items = page.items;
            } else {
                s.items.extend(page.items);
            }
            s.state = phase;
            s.has_more = page.has_more;
            s.loading = false;
            s.loading_more = false;
            s.error = None;
        });
        tracing::debug!(
            platform = %self.adapter.platform(),
            added,
            has_more = page.has_more,
            "Room page applied"
        );
        true
    }

    /// Records a failure for a still-current fetch and hands the error back.
    /// Failures of superseded fetches are dropped.
    fn fail(&self, ticket: &FetchTicket, err: AppError, reset: bool) -> AppResult<()> {
        let mut session = self.session();
        if session.generation != ticket.generation {
            return Ok(());
        }
        session.has_more = false;
        session.in_flight = false;
        session.phase = PagerState::Errored;

        let message = err.user_message();
        self.state_tx.send_modify(|s| {
            if reset {
                s.items.clear();
            }
            s.state = PagerState::Errored;
            s.has_more = false;
            s.loading = false;
            s.loading_more = false;
            s.error = Some(message);
        });
        tracing::warn!(
            platform = %self.adapter.platform(),
            reset,
            error = %err,
            "Room list fetch failed"
        );
        Err(err)
    }
}

/// Runs `fut` unless the ticket is cancelled first.
async fn guarded<T>(ticket: &FetchTicket, fut: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = ticket.cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::backend::BackendError;
    use crate::external::live::{DouyinLive, DouyuLive};
    use crate::session::BackendTokenProvider;
    use crate::test_support::FakeBackend;
    use serde_json::{Value, json};

    fn douyu_rooms(range: std::ops::Range<u32>) -> Vec<Value> {
        range
            .map(|i| json!({"rid": i, "roomName": format!("room {i}"), "nickname": "n"}))
            .collect()
    }

    fn douyu_pager(backend: &Arc<FakeBackend>) -> Arc<RoomListPager> {
        Arc::new(RoomListPager::new(
            Arc::new(DouyuLive::with_page_size(backend.clone(), 20)),
            Arc::new(BackendTokenProvider::new(backend.clone())),
        ))
    }

    fn douyin_pager(backend: &Arc<FakeBackend>) -> Arc<RoomListPager> {
        Arc::new(RoomListPager::new(
            Arc::new(DouyinLive::new(backend.clone())),
            Arc::new(BackendTokenProvider::new(backend.clone())),
        ))
    }

    #[tokio::test]
    async fn test_full_page_then_short_page() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(0..20)}})));
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(20..27)}})));
        let pager = douyu_pager(&backend);

        pager.select_category(Category::new("1")).await.unwrap();
        let state = pager.state();
        assert!(state.has_more);
        assert_eq!(state.state, PagerState::Ready);
        assert_eq!(state.items.len(), 20);

        assert!(pager.load_more().await.unwrap());
        let state = pager.state();
        assert!(!state.has_more);
        assert_eq!(state.state, PagerState::Exhausted);
        assert_eq!(state.items.len(), 27);
        assert_eq!(state.items[26].room_id, "26");

        assert!(!pager.load_more().await.unwrap());
        assert_eq!(backend.list_requests().len(), 2);
        assert_eq!(backend.list_requests()[1].cursor, Cursor::Offset(20));
    }

    #[tokio::test]
    async fn test_count_aware_total() {
        let backend = Arc::new(FakeBackend::new());
        for range in [0..20, 20..40, 40..45] {
            backend.push_list(Ok(
                json!({"error": 0, "data": {"list": douyu_rooms(range), "total": 45}}),
            ));
        }
        let pager = douyu_pager(&backend);

        pager.select_category(Category::new("1")).await.unwrap();
        assert!(pager.load_more().await.unwrap());
        let state = pager.state();
        assert_eq!(state.items.len(), 40);
        assert!(state.has_more);

        assert!(pager.load_more().await.unwrap());
        let state = pager.state();
        assert_eq!(state.items.len(), 45);
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn test_token_failure_never_lists() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_token(Err(BackendError::other("captcha")));
        let pager = douyin_pager(&backend);

        let err = pager
            .select_category(Category::new("720"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TokenUnavailable { .. }));
        assert!(backend.list_requests().is_empty());
        let state = pager.state();
        assert!(state.items.is_empty());
        assert!(!state.has_more);
        assert!(state.error.is_some());
        assert_eq!(state.state, PagerState::Errored);
        assert!(!pager.load_more().await.unwrap());
    }

    #[tokio::test]
    async fn test_token_cached_per_session() {
        let backend = Arc::new(FakeBackend::new());
        for _ in 0..3 {
            backend.push_list(Ok(json!({
                "rooms": [{"room_id": "1"}],
                "has_more": true,
                "next_offset": 15
            })));
        }
        let pager = douyin_pager(&backend);

        pager.select_category(Category::new("720")).await.unwrap();
        pager.load_more().await.unwrap();
        assert_eq!(backend.token_calls(), 1);
        assert_eq!(
            backend.list_requests()[1].session_token.as_deref(),
            Some("fake-token")
        );

        pager.select_category(Category::new("721")).await.unwrap();
        assert_eq!(backend.token_calls(), 2);
    }

    #[tokio::test]
    async fn test_load_more_is_noop_while_in_flight() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(0..20)}})));
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(20..40)}})));
        let gate = backend.gate_lists();
        let pager = douyu_pager(&backend);

        let reset = tokio::spawn({
            let pager = pager.clone();
            async move { pager.select_category(Category::new("1")).await }
        });
        backend.wait_for_list_calls(1).await;
        assert!(!pager.load_more().await.unwrap());
        gate.add_permits(1);
        reset.await.unwrap().unwrap();

        let more = tokio::spawn({
            let pager = pager.clone();
            async move { pager.load_more().await }
        });
        backend.wait_for_list_calls(2).await;
        assert!(pager.state().loading_more);
        assert!(!pager.load_more().await.unwrap());
        assert!(!pager.load_more().await.unwrap());
        gate.add_permits(1);
        assert!(more.await.unwrap().unwrap());

        assert_eq!(backend.list_requests().len(), 2);
        assert_eq!(pager.state().items.len(), 40);
    }

    #[tokio::test]
    async fn test_second_reset_supersedes_first() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(100..103)}})));
        let gate = backend.gate_lists();
        let pager = douyu_pager(&backend);

        let first = tokio::spawn({
            let pager = pager.clone();
            async move { pager.select_category(Category::new("first")).await }
        });
        backend.wait_for_list_calls(1).await;

        let second = tokio::spawn({
            let pager = pager.clone();
            async move { pager.select_category(Category::new("second")).await }
        });
        backend.wait_for_list_calls(2).await;
        first.await.unwrap().unwrap();

        gate.add_permits(1);
        second.await.unwrap().unwrap();

        let state = pager.state();
        assert_eq!(state.category, Some(Category::new("second")));
        let ids: Vec<_> = state.items.iter().map(|s| s.room_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "101", "102"]);
        assert!(!state.has_more);
    }

    #[tokio::test]
    async fn test_reset_failure_clears_items() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(0..20)}})));
        backend.push_list(Err(BackendError::other("HTTP 502")));
        let pager = douyu_pager(&backend);

        pager.select_category(Category::new("1")).await.unwrap();
        let err = pager.reset().await.unwrap_err();

        assert!(matches!(err, AppError::AdapterFetch { .. }));
        let state = pager.state();
        assert!(state.items.is_empty());
        assert!(!state.has_more);
        assert_eq!(state.state, PagerState::Errored);
    }

    #[tokio::test]
    async fn test_load_more_failure_keeps_items() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(0..20)}})));
        backend.push_list(Err(BackendError::other("HTTP 429")));
        let pager = douyu_pager(&backend);

        pager.select_category(Category::new("1")).await.unwrap();
        assert!(pager.load_more().await.is_err());

        let state = pager.state();
        assert_eq!(state.items.len(), 20);
        assert!(!state.has_more);
        assert!(state.error.is_some());
        assert!(!pager.load_more().await.unwrap());
        assert_eq!(backend.list_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_without_category() {
        let pager = douyu_pager(&Arc::new(FakeBackend::new()));
        assert!(matches!(
            pager.reset().await,
            Err(AppError::Validation { .. })
        ));
        assert!(!pager.load_more().await.unwrap());
        assert_eq!(pager.state().state, PagerState::Idle);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_list(Ok(json!({"error": 0, "data": {"list": douyu_rooms(0..3)}})));
        let pager = douyu_pager(&backend);
        let mut rx = pager.subscribe();

        pager.select_category(Category::new("1")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().items.len(), 3);

        pager.clear();
        assert_eq!(rx.borrow_and_update().state, PagerState::Idle);
        assert!(pager.state().items.is_empty());
    }
}
