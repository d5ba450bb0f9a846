use serde::{Deserialize, Serialize};

use super::pagination::Cursor;
use super::platform::LivePlatform;

pub const PLACEHOLDER_NICKNAME: &str = "未知主播";
pub const PLACEHOLDER_TITLE: &str = "未知标题";
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/320x180.png?text=No+Image";
pub const DEFAULT_VIEWER_COUNT: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiveStatus {
    Live,
    Replay,
    Offline,
    Unknown,
}

impl LiveStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, LiveStatus::Live)
    }
}

/// A browse selection. Third-level categories carry their parent id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }
}

/// Normalized room entry shared by every platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonStreamer {
    pub room_id: String,
    pub title: String,
    pub nickname: String,
    pub avatar: String,
    pub room_cover: String,
    pub viewer_count_str: String,
    pub platform: LivePlatform,
}

/// Raw fields as found in a platform payload, before placeholders are applied.
#[derive(Debug, Default)]
pub(crate) struct RawStreamerFields {
    pub room_id: Option<String>,
    pub title: Option<String>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub room_cover: Option<String>,
    pub viewer_count: Option<String>,
}

impl RawStreamerFields {
    /// Fills every missing or blank field. Returns `None` when the room id is
    /// missing, since such entries cannot be opened or followed.
    pub fn normalize(self, platform: LivePlatform) -> Option<CommonStreamer> {
        let Some(room_id) = non_blank(self.room_id) else {
            tracing::warn!(%platform, title = ?self.title, "Skipping room entry without room id");
            return None;
        };
        Some(CommonStreamer {
            room_id,
            title: non_blank(self.title).unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            nickname: non_blank(self.nickname).unwrap_or_else(|| PLACEHOLDER_NICKNAME.to_string()),
            avatar: non_blank(self.avatar).unwrap_or_default(),
            room_cover: non_blank(self.room_cover).unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
            viewer_count_str: non_blank(self.viewer_count)
                .unwrap_or_else(|| DEFAULT_VIEWER_COUNT.to_string()),
            platform,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One page of normalized rooms plus the cursor for the next request.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPage {
    pub items: Vec<CommonStreamer>,
    pub next_cursor: Cursor,
    pub has_more: bool,
}

/// A quality option offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamVariant {
    pub quality: String,
    #[serde(default)]
    pub bit_rate: Option<u64>,
    pub url: String,
}

/// Whether the resolved URL can be played as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The backend already serves the stream locally, or the URL is directly playable.
    AlreadyLocal,
    /// The raw upstream URL needs to go through the local relay.
    RequiresProxy,
}

/// Result of stream resolution before variant selection and classification.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub variants: Vec<StreamVariant>,
    pub primary_url: Option<String>,
    /// Container names or URLs reported alongside the primary URL.
    pub format_hints: Vec<String>,
    pub upstream_url: Option<String>,
    pub delivery: Delivery,
}

/// Fresh details for a followed streamer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub live_status: LiveStatus,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub room_title: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl StatusUpdate {
    pub fn status_only(live_status: LiveStatus) -> Self {
        Self {
            live_status,
            nickname: None,
            room_title: None,
            avatar_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_applies_placeholders() {
        let raw = RawStreamerFields {
            room_id: Some("123".into()),
            title: Some("   ".into()),
            ..Default::default()
        };
        let streamer = raw.normalize(LivePlatform::Huya).unwrap();
        assert_eq!(streamer.room_id, "123");
        assert_eq!(streamer.title, PLACEHOLDER_TITLE);
        assert_eq!(streamer.nickname, PLACEHOLDER_NICKNAME);
        assert_eq!(streamer.room_cover, PLACEHOLDER_COVER);
        assert_eq!(streamer.viewer_count_str, "0");
        assert_eq!(streamer.avatar, "");
        assert_eq!(streamer.platform, LivePlatform::Huya);
    }

    #[test]
    fn test_normalize_skips_missing_room_id() {
        let raw = RawStreamerFields {
            title: Some("title".into()),
            ..Default::default()
        };
        assert!(raw.normalize(LivePlatform::Douyu).is_none());
    }

    #[test]
    fn test_live_status_serializes_uppercase() {
        let json = serde_json::to_string(&LiveStatus::Replay).unwrap();
        assert_eq!(json, "\"REPLAY\"");
    }

    #[test]
    fn test_category_with_parent() {
        let category = Category::new("c3").with_parent("c2");
        assert_eq!(category.parent_id.as_deref(), Some("c2"));
    }
}
