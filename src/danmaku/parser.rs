//! Per-platform decoding of raw chat payloads.
//!
//! | Platform | Chat | Enter |
//! |---|---|---|
//! | Douyu | `type: "chatmsg"` | `type: "uenter"` |
//! | Douyin | `method: "WebcastChatMessage"` or no method | `method: "WebcastMemberMessage"` |
//! | Bilibili | `cmd: "DANMU_MSG..."` | `cmd: "INTERACT_WORD"`, `msg_type: 1` |
//! | Huya | `type: "chat"` | `type: "enter"` |
//!
//! Anything else decodes to `None`.

use serde::Deserialize;
use serde_json::Value;

use super::message::{DanmakuDraft, DanmakuKind};
use crate::external::live::{LivePlatform, deserialize_optional_count, deserialize_optional_id};

/// Name of the push channel carrying chat for a room.
pub fn channel_name(platform: LivePlatform, room_id: &str) -> String {
    match platform {
        LivePlatform::Douyu => format!("danmaku-{}", room_id),
        _ => "danmaku-message".to_string(),
    }
}

pub(crate) fn parse(platform: LivePlatform, payload: &Value) -> Option<DanmakuDraft> {
    match platform {
        LivePlatform::Douyu => parse_douyu(payload),
        LivePlatform::Douyin => parse_douyin(payload),
        LivePlatform::Bilibili => parse_bilibili(payload),
        LivePlatform::Huya => parse_huya(payload),
    }
}

fn decode<T: for<'de> Deserialize<'de>>(platform: LivePlatform, payload: &Value) -> Option<T> {
    match T::deserialize(payload) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::debug!(%platform, error = %e, "Ignoring undecodable chat payload");
            None
        }
    }
}

// ============================================================================
// Douyu
// ============================================================================

#[derive(Debug, Deserialize)]
struct DouyuPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    room_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    uid: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    level: Option<u64>,
    #[serde(rename = "badgeName", default)]
    badge_name: Option<String>,
    #[serde(rename = "badgeLevel", default, deserialize_with = "deserialize_optional_count")]
    badge_level: Option<u64>,
    #[serde(default)]
    color: Option<String>,
}

fn parse_douyu(payload: &Value) -> Option<DanmakuDraft> {
    let raw: DouyuPayload = decode(LivePlatform::Douyu, payload)?;
    let kind = match raw.kind.as_str() {
        "chatmsg" => DanmakuKind::Chat,
        "uenter" => DanmakuKind::Enter,
        _ => return None,
    };
    Some(DanmakuDraft {
        room_id: raw.room_id,
        uid: raw.uid,
        nickname: raw.nickname,
        content: raw.content,
        level: raw.level,
        badge_name: raw.badge_name,
        badge_level: raw.badge_level,
        color: raw.color,
        ..DanmakuDraft::new(kind)
    })
}

// ============================================================================
// Douyin
// ============================================================================

#[derive(Debug, Deserialize)]
struct DouyinPayload {
    #[serde(default)]
    method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    room_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    user_id: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    user_level: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    fans_club_level: Option<u64>,
}

fn parse_douyin(payload: &Value) -> Option<DanmakuDraft> {
    let raw: DouyinPayload = decode(LivePlatform::Douyin, payload)?;
    let kind = match raw.method.as_deref() {
        None | Some("WebcastChatMessage") => DanmakuKind::Chat,
        Some("WebcastMemberMessage") => DanmakuKind::Enter,
        Some(_) => return None,
    };
    Some(DanmakuDraft {
        room_id: raw.room_id,
        uid: raw.user_id,
        nickname: raw.user,
        content: raw.content,
        level: raw.user_level,
        badge_level: raw.fans_club_level,
        ..DanmakuDraft::new(kind)
    })
}

// ============================================================================
// Bilibili
// ============================================================================

#[derive(Debug, Deserialize)]
struct BilibiliPayload {
    cmd: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    room_id: Option<String>,
    #[serde(default)]
    info: Vec<Value>,
    #[serde(default)]
    data: Option<BilibiliInteract>,
}

#[derive(Debug, Deserialize)]
struct BilibiliInteract {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    uid: Option<String>,
    #[serde(default)]
    uname: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    roomid: Option<String>,
    /// 1 enter, 2 follow, 3 share
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    msg_type: Option<u64>,
    #[serde(default)]
    fans_medal: Option<BilibiliMedal>,
}

#[derive(Debug, Deserialize)]
struct BilibiliMedal {
    #[serde(default)]
    medal_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    medal_level: Option<u64>,
}

fn parse_bilibili(payload: &Value) -> Option<DanmakuDraft> {
    let raw: BilibiliPayload = decode(LivePlatform::Bilibili, payload)?;

    // DANMU_MSG carries protocol suffixes such as "DANMU_MSG:4:0:2:2:2:0"
    if raw.cmd.split(':').next() == Some("DANMU_MSG") {
        return Some(bilibili_chat(raw.room_id, &raw.info));
    }
    if raw.cmd != "INTERACT_WORD" {
        return None;
    }

    let data = raw.data?;
    if data.msg_type.unwrap_or(1) != 1 {
        return None;
    }
    let (badge_name, badge_level) = match data.fans_medal {
        Some(medal) => (medal.medal_name, medal.medal_level),
        None => (None, None),
    };
    Some(DanmakuDraft {
        room_id: raw.room_id.or(data.roomid),
        uid: data.uid,
        nickname: data.uname,
        badge_name,
        badge_level,
        ..DanmakuDraft::new(DanmakuKind::Enter)
    })
}

/// `info[0][3]` color, `info[1]` text, `info[2]` `[uid, name, ..]`,
/// `info[3]` `[medal level, medal name, ..]`, `info[4][0]` user level.
fn bilibili_chat(room_id: Option<String>, info: &[Value]) -> DanmakuDraft {
    let at = |outer: usize, inner: usize| info.get(outer).and_then(|v| v.get(inner));

    DanmakuDraft {
        room_id,
        uid: at(2, 0).and_then(value_to_string),
        nickname: at(2, 1).and_then(|v| v.as_str()).map(str::to_string),
        content: info.get(1).and_then(|v| v.as_str()).map(str::to_string),
        level: at(4, 0).and_then(Value::as_u64),
        badge_name: at(3, 1).and_then(|v| v.as_str()).map(str::to_string),
        badge_level: at(3, 0).and_then(Value::as_u64),
        color: at(0, 3)
            .and_then(Value::as_u64)
            .filter(|rgb| *rgb != 0)
            .map(|rgb| format!("#{:06X}", rgb & 0xFF_FFFF)),
        ..DanmakuDraft::new(DanmakuKind::Chat)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Huya
// ============================================================================

#[derive(Debug, Deserialize)]
struct HuyaPayload {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    room_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    uid: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    level: Option<u64>,
    #[serde(default)]
    badge_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    badge_level: Option<u64>,
    #[serde(default)]
    color: Option<String>,
}

fn parse_huya(payload: &Value) -> Option<DanmakuDraft> {
    let raw: HuyaPayload = decode(LivePlatform::Huya, payload)?;
    let kind = match raw.kind.as_str() {
        "chat" => DanmakuKind::Chat,
        "enter" => DanmakuKind::Enter,
        _ => return None,
    };
    Some(DanmakuDraft {
        room_id: raw.room_id,
        uid: raw.uid,
        nickname: raw.nickname,
        content: raw.content,
        level: raw.level,
        badge_name: raw.badge_name,
        badge_level: raw.badge_level,
        color: raw.color,
        ..DanmakuDraft::new(kind)
    })
}
