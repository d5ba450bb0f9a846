use serde::Deserialize;

use crate::external::live::provider::{deserialize_optional_count, deserialize_optional_id};

#[derive(Debug, Deserialize)]
pub(super) struct DouyuListResponse {
    pub error: i32,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<DouyuListData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyuListData {
    #[serde(default)]
    pub list: Vec<DouyuListItem>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub page_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DouyuListItem {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub rid: Option<String>,
    #[serde(default)]
    pub room_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub room_src: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub hn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DouyuPlaybackDetails {
    #[serde(default)]
    pub primary_url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub quality_options: Vec<DouyuQualityOption>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DouyuQualityOption {
    pub quality: String,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub bit_rate: Option<u64>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyuBetardResponse {
    pub room: DouyuBetardRoom,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyuBetardRoom {
    #[serde(default)]
    pub room_name: Option<String>,
    pub show_status: i32,
    #[serde(rename = "videoLoop", default)]
    pub video_loop: i32,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<DouyuAvatar>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DouyuAvatar {
    pub big: Option<String>,
    pub middle: Option<String>,
    pub small: Option<String>,
}

impl DouyuAvatar {
    pub fn get_best(&self) -> Option<String> {
        self.big
            .as_ref()
            .or(self.middle.as_ref())
            .or(self.small.as_ref())
            .cloned()
    }
}
