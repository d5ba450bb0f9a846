use serde::Serialize;

use crate::external::live::{Category, CommonStreamer, LivePlatform};

/// Lifecycle of one (platform, category) browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PagerState {
    Idle,
    TokenPending,
    Ready,
    Fetching,
    Exhausted,
    Errored,
}

/// Snapshot of a room list as seen by the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListState {
    pub platform: LivePlatform,
    pub category: Option<Category>,
    pub items: Vec<CommonStreamer>,
    pub state: PagerState,
    /// A reset fetch is running
    pub loading: bool,
    /// A load-more fetch is running
    pub loading_more: bool,
    pub has_more: bool,
    pub error: Option<String>,
}

impl ListState {
    pub fn idle(platform: LivePlatform) -> Self {
        Self {
            platform,
            category: None,
            items: Vec::new(),
            state: PagerState::Idle,
            loading: false,
            loading_more: false,
            has_more: false,
            error: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
