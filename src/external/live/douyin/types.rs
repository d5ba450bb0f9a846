use serde::Deserialize;

use crate::external::live::provider::{deserialize_optional_count, deserialize_optional_id};

#[derive(Debug, Deserialize)]
pub(super) struct DouyinListResponse {
    #[serde(default)]
    pub rooms: Vec<DouyinListRoom>,
    #[serde(default)]
    pub has_more: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub next_offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyinListRoom {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub web_rid: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub room_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub owner_nickname: Option<String>,
    #[serde(default)]
    pub user_count_str: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Stream answer. The backend already relays the stream, so `stream_url`
/// is a local address when the room is live.
#[derive(Debug, Deserialize)]
pub(super) struct DouyinStreamInfo {
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub upstream_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyinEnterRoomResp {
    pub status_code: i32,
    pub data: Option<DouyinEnterRoomData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyinEnterRoomData {
    pub data: Option<Vec<DouyinRoomDetail>>,
    pub room_status: Option<i32>,
    #[serde(default)]
    pub user: Option<DouyinBaseInfo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyinRoomDetail {
    pub title: Option<String>,
    #[serde(default)]
    pub owner: Option<DouyinBaseInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct DouyinBaseInfo {
    pub nickname: Option<String>,
    pub avatar_thumb: Option<DouyinAvatarThumb>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct DouyinAvatarThumb {
    pub url_list: Option<Vec<String>>,
}
