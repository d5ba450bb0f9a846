use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::external::live::LivePlatform;

pub const UNKNOWN_SENDER: &str = "未知用户";
pub const ENTER_NOTICE: &str = "进入了直播间";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanmakuKind {
    Chat,
    /// A viewer joined the room
    Enter,
}

/// Chat message in the shape shared by every platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanmakuMessage {
    pub id: String,
    pub platform: LivePlatform,
    pub kind: DanmakuKind,
    pub room_id: String,
    pub uid: Option<String>,
    pub nickname: String,
    pub content: String,
    pub level: u32,
    pub badge_name: Option<String>,
    pub badge_level: Option<u32>,
    pub color: Option<String>,
}

/// Fields recovered from a raw payload, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DanmakuDraft {
    pub kind: DanmakuKind,
    pub id: Option<String>,
    pub room_id: Option<String>,
    pub uid: Option<String>,
    pub nickname: Option<String>,
    pub content: Option<String>,
    pub level: Option<u64>,
    pub badge_name: Option<String>,
    pub badge_level: Option<u64>,
    pub color: Option<String>,
}

impl DanmakuDraft {
    pub fn new(kind: DanmakuKind) -> Self {
        Self {
            kind,
            id: None,
            room_id: None,
            uid: None,
            nickname: None,
            content: None,
            level: None,
            badge_name: None,
            badge_level: None,
            color: None,
        }
    }

    /// Applies defaults. Payloads without a room id are attributed to
    /// `session_room`; chat drafts without text yield `None`.
    pub fn finish(self, platform: LivePlatform, session_room: &str) -> Option<DanmakuMessage> {
        let content = match (self.kind, non_blank(self.content)) {
            (_, Some(content)) => content,
            (DanmakuKind::Enter, None) => ENTER_NOTICE.to_string(),
            (DanmakuKind::Chat, None) => return None,
        };

        Some(DanmakuMessage {
            id: non_blank(self.id).unwrap_or_else(|| Uuid::new_v4().to_string()),
            platform,
            kind: self.kind,
            room_id: non_blank(self.room_id).unwrap_or_else(|| session_room.to_string()),
            uid: non_blank(self.uid),
            nickname: non_blank(self.nickname).unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            content,
            level: self.level.map(saturate).unwrap_or(0),
            badge_name: non_blank(self.badge_name),
            badge_level: self.badge_level.map(saturate).filter(|level| *level > 0),
            color: non_blank(self.color),
        })
    }
}

fn saturate(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
