use serde::Deserialize;

use crate::external::live::provider::{deserialize_optional_count, deserialize_optional_id};

#[derive(Debug, Deserialize)]
pub(super) struct HuyaListResponse {
    pub error: i32,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Vec<HuyaListItem>>,
}

/// List entries come either pre-normalized or in the raw `s*`/`l*` shape.
#[derive(Debug, Deserialize)]
pub(super) struct HuyaListItem {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub room_id: Option<String>,
    #[serde(
        rename = "lProfileRoom",
        default,
        deserialize_with = "deserialize_optional_id"
    )]
    pub profile_room: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "sIntroduction", default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(rename = "sNick", default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(rename = "sAvatar180", default)]
    pub avatar180: Option<String>,
    #[serde(default)]
    pub room_cover: Option<String>,
    #[serde(rename = "sScreenshot", default)]
    pub screenshot: Option<String>,
    #[serde(default)]
    pub viewer_count_str: Option<String>,
    #[serde(
        rename = "lUserCount",
        default,
        deserialize_with = "deserialize_optional_count"
    )]
    pub user_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HuyaStreamResponse {
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub flv_tx_urls: Vec<HuyaStreamEntry>,
    #[serde(default)]
    pub selected_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct HuyaStreamEntry {
    pub quality: String,
    #[serde(rename = "bitRate", default)]
    pub bit_rate: Option<i64>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct MpApiResponse {
    pub status: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<MpData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MpData {
    #[serde(rename = "realLiveStatus")]
    pub real_live_status: Option<String>,
    #[serde(rename = "liveStatus")]
    pub live_status: Option<String>,
    #[serde(rename = "profileInfo", default)]
    pub profile_info: Option<ProfileInfo>,
    #[serde(rename = "liveData", default)]
    pub live_data: Option<LiveData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileInfo {
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub avatar180: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LiveData {
    #[serde(default)]
    pub introduction: Option<String>,
}
