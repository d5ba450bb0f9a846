use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;

use super::model::FollowedStreamer;
use super::repository::FollowRepository;
use crate::external::live::{AdapterRegistry, LivePlatform, LiveStatus, StatusUpdate};

/// Outcome of one [`FollowStore::refresh_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub refreshed: usize,
    /// Entries whose refresh failed and were marked offline
    pub failed: usize,
}

/// The followed-streamer list.
///
/// Memory is authoritative: every mutation saves the full list as its last
/// step, and a failed save is logged without undoing the change.
pub struct FollowStore {
    repository: Arc<dyn FollowRepository>,
    adapters: AdapterRegistry,
    items: Mutex<Vec<FollowedStreamer>>,
}

impl FollowStore {
    pub fn new(repository: Arc<dyn FollowRepository>, adapters: AdapterRegistry) -> Self {
        Self {
            repository,
            adapters,
            items: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the in-memory list with the stored one. Unreadable data
    /// yields an empty list. Returns the number of entries loaded.
    pub async fn load(&self) -> usize {
        let loaded = match self.repository.load().await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(error = %e, "Follow list could not be loaded, starting empty");
                Vec::new()
            }
        };
        let loaded = dedupe(loaded);
        let count = loaded.len();
        *self.items.lock().await = loaded;
        tracing::debug!(count, "Follow list loaded");
        count
    }

    /// Adds `streamer` unless its key is already followed. Returns whether it
    /// was added.
    pub async fn follow(&self, streamer: FollowedStreamer) -> bool {
        let mut items = self.items.lock().await;
        if items.iter().any(|s| s.matches(streamer.platform, &streamer.id)) {
            return false;
        }
        tracing::info!(platform = %streamer.platform, id = %streamer.id, "Followed streamer");
        items.push(streamer);
        self.persist(&items).await;
        true
    }

    /// Removes the entry for the key. Unknown keys are a no-op.
    pub async fn unfollow(&self, platform: LivePlatform, id: &str) -> bool {
        let mut items = self.items.lock().await;
        let Some(index) = items.iter().position(|s| s.matches(platform, id)) else {
            return false;
        };
        items.remove(index);
        tracing::info!(%platform, id, "Unfollowed streamer");
        self.persist(&items).await;
        true
    }

    pub async fn is_followed(&self, platform: LivePlatform, id: &str) -> bool {
        self.items.lock().await.iter().any(|s| s.matches(platform, id))
    }

    pub async fn get(&self, platform: LivePlatform, id: &str) -> Option<FollowedStreamer> {
        self.items
            .lock()
            .await
            .iter()
            .find(|s| s.matches(platform, id))
            .cloned()
    }

    /// Stored order.
    pub async fn entries(&self) -> Vec<FollowedStreamer> {
        self.items.lock().await.clone()
    }

    /// Display order: pinned entries first, stored order otherwise kept.
    pub async fn list(&self) -> Vec<FollowedStreamer> {
        let mut items = self.entries().await;
        items.sort_by_key(|s| !s.is_pinned);
        items
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Merges fresh details into an entry. Returns `false` for unknown keys.
    pub async fn update_details(&self, platform: LivePlatform, id: &str, update: StatusUpdate) -> bool {
        self.modify(platform, id, |s| s.apply(update)).await
    }

    pub async fn set_pinned(&self, platform: LivePlatform, id: &str, pinned: bool) -> bool {
        self.modify(platform, id, |s| s.is_pinned = pinned).await
    }

    /// Replaces the stored order. Repeated keys keep their first occurrence.
    pub async fn reorder(&self, new_order: Vec<FollowedStreamer>) {
        let mut items = self.items.lock().await;
        *items = dedupe(new_order);
        self.persist(&items).await;
    }

    /// Refreshes every entry concurrently. A failed entry is marked offline
    /// and does not affect the others.
    pub async fn refresh_all(&self) -> RefreshSummary {
        let targets: Vec<(LivePlatform, String)> = self
            .items
            .lock()
            .await
            .iter()
            .map(|s| (s.platform, s.id.clone()))
            .collect();
        if targets.is_empty() {
            return RefreshSummary::default();
        }

        let results = join_all(targets.into_iter().map(|(platform, id)| async move {
            let result = match self.adapters.require(platform) {
                Ok(adapter) => adapter.refresh_status(&id).await,
                Err(e) => Err(e),
            };
            (platform, id, result)
        }))
        .await;

        let mut summary = RefreshSummary::default();
        let mut items = self.items.lock().await;
        for (platform, id, result) in results {
            // the entry may have been unfollowed while refreshing
            let Some(entry) = items.iter_mut().find(|s| s.matches(platform, &id)) else {
                continue;
            };
            match result {
                Ok(update) => {
                    entry.apply(update);
                    summary.refreshed += 1;
                }
                Err(e) => {
                    tracing::warn!(%platform, id = %id, error = %e, "Status refresh failed, marking offline");
                    entry.live_status = LiveStatus::Offline;
                    summary.failed += 1;
                }
            }
        }
        self.persist(&items).await;

        tracing::info!(
            refreshed = summary.refreshed,
            failed = summary.failed,
            "Follow list refreshed"
        );
        summary
    }

    async fn modify(
        &self,
        platform: LivePlatform,
        id: &str,
        change: impl FnOnce(&mut FollowedStreamer),
    ) -> bool {
        let mut items = self.items.lock().await;
        let Some(entry) = items.iter_mut().find(|s| s.matches(platform, id)) else {
            return false;
        };
        change(entry);
        self.persist(&items).await;
        true
    }

    async fn persist(&self, items: &[FollowedStreamer]) {
        if let Err(e) = self.repository.save(items).await {
            tracing::warn!(error = %e, count = items.len(), "Failed to persist follow list");
        }
    }
}

fn dedupe(items: Vec<FollowedStreamer>) -> Vec<FollowedStreamer> {
    let mut unique: Vec<FollowedStreamer> = Vec::with_capacity(items.len());
    for item in items {
        if unique.iter().any(|s| s.matches(item.platform, &item.id)) {
            tracing::warn!(platform = %item.platform, id = %item.id, "Dropping duplicate follow entry");
            continue;
        }
        unique.push(item);
    }
    unique
}
