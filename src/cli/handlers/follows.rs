//! `livehub follows ...`: edit the follow list offline.

use std::fmt::Write;
use std::sync::Arc;

use crate::cli::parser::FollowsAction;
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use crate::external::live::{AdapterRegistry, LivePlatform, LiveStatus};
use crate::follow::{FollowStore, FollowedStreamer, JsonFileFollowRepository};

/// Works on the stored list only. Status refresh needs a live backend and is
/// left to the hub.
pub struct FollowsCommandHandler {
    store: FollowStore,
}

impl FollowsCommandHandler {
    pub fn new(settings: &Settings) -> Self {
        let repository = Arc::new(JsonFileFollowRepository::new(&settings.follows.store_path));
        Self {
            store: FollowStore::new(repository, AdapterRegistry::empty()),
        }
    }

    pub async fn execute(&self, action: &FollowsAction) -> AppResult<()> {
        let output = self.run(action).await?;
        print!("{}", output);
        Ok(())
    }

    async fn run(&self, action: &FollowsAction) -> AppResult<String> {
        let count = self.store.load().await;
        tracing::debug!(count, "Follow list opened");

        match action {
            FollowsAction::List { json } => {
                let items = self.store.list().await;
                if *json {
                    serde_json::to_string_pretty(&items)
                        .map(|s| s + "\n")
                        .map_err(|e| AppError::Internal {
                            source: anyhow::Error::from(e),
                        })
                } else {
                    Ok(render_table(&items))
                }
            }
            FollowsAction::Remove { platform, id } => {
                let removed = self.store.unfollow(*platform, id).await;
                outcome(removed, "Removed", *platform, id)
            }
            FollowsAction::Pin { platform, id } => {
                let changed = self.store.set_pinned(*platform, id, true).await;
                outcome(changed, "Pinned", *platform, id)
            }
            FollowsAction::Unpin { platform, id } => {
                let changed = self.store.set_pinned(*platform, id, false).await;
                outcome(changed, "Unpinned", *platform, id)
            }
        }
    }
}

fn outcome(changed: bool, verb: &str, platform: LivePlatform, id: &str) -> AppResult<String> {
    if changed {
        Ok(format!("{} {}/{}\n", verb, platform, id))
    } else {
        Err(AppError::Validation {
            field: "id".to_string(),
            reason: format!("{}/{} is not followed", platform, id),
        })
    }
}

fn render_table(items: &[FollowedStreamer]) -> String {
    if items.is_empty() {
        return "No followed streamers\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        let status = match item.live_status {
            LiveStatus::Live => "live",
            LiveStatus::Replay => "replay",
            LiveStatus::Offline => "offline",
            LiveStatus::Unknown => "-",
        };
        let _ = writeln!(
            out,
            "{} {:<9} {:<14} {:<8} {}{}",
            if item.is_pinned { "*" } else { " " },
            item.platform,
            item.id,
            status,
            item.nickname,
            item.room_title
                .as_deref()
                .map(|title| format!("  {}", title))
                .unwrap_or_default(),
        );
    }
    out
}
