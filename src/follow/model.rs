use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::external::live::{CommonStreamer, LivePlatform, LiveStatus, StatusUpdate};

/// A followed streamer. `(platform, id)` is unique within a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowedStreamer {
    pub platform: LivePlatform,
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub room_title: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default = "unknown_status")]
    pub live_status: LiveStatus,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default = "Timestamp::now")]
    pub followed_at: Timestamp,
}

fn unknown_status() -> LiveStatus {
    LiveStatus::Unknown
}

impl FollowedStreamer {
    pub fn new(platform: LivePlatform, id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
            nickname: nickname.into(),
            room_title: None,
            avatar_url: String::new(),
            live_status: LiveStatus::Unknown,
            is_pinned: false,
            followed_at: Timestamp::now(),
        }
    }

    /// Entry for a room picked from a browse list, which only shows live rooms.
    pub fn from_streamer(streamer: &CommonStreamer) -> Self {
        Self {
            room_title: Some(streamer.title.clone()),
            avatar_url: streamer.avatar.clone(),
            live_status: LiveStatus::Live,
            ..Self::new(streamer.platform, &streamer.room_id, &streamer.nickname)
        }
    }

    pub fn matches(&self, platform: LivePlatform, id: &str) -> bool {
        self.platform == platform && self.id == id
    }

    /// Merges a partial update. Absent or blank fields keep their value.
    pub fn apply(&mut self, update: StatusUpdate) {
        self.live_status = update.live_status;
        if let Some(nickname) = filled(update.nickname) {
            self.nickname = nickname;
        }
        if let Some(title) = filled(update.room_title) {
            self.room_title = Some(title);
        }
        if let Some(avatar) = filled(update.avatar_url) {
            self.avatar_url = avatar;
        }
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_keeps_missing_fields() {
        let mut streamer = FollowedStreamer::new(LivePlatform::Huya, "1", "主播");
        streamer.room_title = Some("旧标题".into());

        streamer.apply(StatusUpdate {
            live_status: LiveStatus::Replay,
            nickname: Some(" ".into()),
            room_title: None,
            avatar_url: Some("a.jpg".into()),
        });

        assert_eq!(streamer.live_status, LiveStatus::Replay);
        assert_eq!(streamer.nickname, "主播");
        assert_eq!(streamer.room_title.as_deref(), Some("旧标题"));
        assert_eq!(streamer.avatar_url, "a.jpg");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let streamer: FollowedStreamer = serde_json::from_str(
            r#"{"platform": "douyu", "id": "9999", "nickname": "n"}"#,
        )
        .unwrap();
        assert_eq!(streamer.live_status, LiveStatus::Unknown);
        assert!(!streamer.is_pinned);
        assert!(streamer.room_title.is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        let streamer = FollowedStreamer::new(LivePlatform::Bilibili, "6", "n");
        let json = serde_json::to_value(&streamer).unwrap();
        assert_eq!(json["liveStatus"], "UNKNOWN");
        assert_eq!(json["isPinned"], false);
        assert!(json["followedAt"].is_string());
    }
}
