use serde::Deserialize;

use crate::external::live::provider::{deserialize_optional_count, deserialize_optional_id};

#[derive(Debug, Deserialize)]
pub(super) struct BiliResponse<T> {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliListData {
    #[serde(default)]
    pub list: Vec<BiliListRoom>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub has_more: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliListRoom {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub roomid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uname: Option<String>,
    #[serde(default)]
    pub face: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub user_cover: Option<String>,
    #[serde(default)]
    pub system_cover: Option<String>,
    #[serde(default)]
    pub watched_show: Option<BiliWatchedShow>,
    #[serde(default, deserialize_with = "deserialize_optional_count")]
    pub online: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliWatchedShow {
    #[serde(default)]
    pub text_small: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliStreamInfo {
    #[serde(default)]
    pub stream_url: Option<String>,
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub upstream_url: Option<String>,
    #[serde(default)]
    pub available_streams: Option<Vec<BiliStreamVariant>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliStreamVariant {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BiliRoomData {
    #[serde(default)]
    pub title: Option<String>,
    pub live_status: u8,
    #[serde(default)]
    pub uname: Option<String>,
    #[serde(default)]
    pub face: Option<String>,
}
