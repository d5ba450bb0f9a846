use std::sync::Arc;

use async_trait::async_trait;

use super::types::{HuyaListItem, HuyaListResponse, HuyaStreamResponse, MpApiResponse, MpData};
use crate::error::{AppError, AppResult};
use crate::external::backend::{ListRoomsRequest, LiveBackend};
use crate::external::live::pagination::{
    Cursor, FullPageStrategy, PageReport, PaginationStrategy,
};
use crate::external::live::platform::LivePlatform;
use crate::external::live::provider::{
    PlatformAdapter, decode_payload, fetch_failure, stream_failure, stream_offline,
    stream_transient,
};
use crate::external::live::types::{
    Category, Delivery, LiveStatus, RawStreamerFields, RoomPage, StatusUpdate, StreamDescriptor,
    StreamVariant,
};
use crate::session::SessionToken;

pub const HUYA_PAGE_SIZE: usize = 120;

pub struct HuyaLive {
    backend: Arc<dyn LiveBackend>,
    page_size: usize,
    strategy: FullPageStrategy,
}

impl HuyaLive {
    pub fn new(backend: Arc<dyn LiveBackend>) -> Self {
        Self::with_page_size(backend, HUYA_PAGE_SIZE)
    }

    pub fn with_page_size(backend: Arc<dyn LiveBackend>, page_size: usize) -> Self {
        Self {
            backend,
            page_size,
            strategy: FullPageStrategy,
        }
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::AdapterFetch {
            platform: LivePlatform::Huya,
            message: message.into(),
            source,
        }
    }

    fn map_item(item: HuyaListItem) -> RawStreamerFields {
        let viewer_count = item
            .viewer_count_str
            .or_else(|| item.user_count.filter(|v| *v > 0).map(|v| v.to_string()));
        RawStreamerFields {
            room_id: item.room_id.or(item.profile_room),
            title: item.title.or(item.introduction),
            nickname: item.nickname.or(item.nick),
            avatar: item.avatar.or(item.avatar180),
            room_cover: item.room_cover.or(item.screenshot),
            viewer_count,
        }
    }

    fn parse_live_status(data: &MpData) -> LiveStatus {
        let is_live = data.real_live_status.as_deref() == Some("ON")
            && data.live_status.as_deref() == Some("ON");
        let is_replay = data
            .live_data
            .as_ref()
            .and_then(|d| d.introduction.as_deref())
            .is_some_and(|intro| intro.starts_with("【回放】"));

        if is_replay {
            LiveStatus::Replay
        } else if is_live {
            LiveStatus::Live
        } else {
            LiveStatus::Offline
        }
    }
}

#[async_trait]
impl PlatformAdapter for HuyaLive {
    fn platform(&self) -> LivePlatform {
        LivePlatform::Huya
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn initial_cursor(&self) -> Cursor {
        Cursor::Page(1)
    }

    async fn list_rooms(
        &self,
        category: &Category,
        cursor: Cursor,
        _token: Option<&SessionToken>,
    ) -> AppResult<RoomPage> {
        let request = ListRoomsRequest {
            platform: LivePlatform::Huya,
            category: category.clone(),
            cursor,
            page_size: self.page_size,
            session_token: None,
        };
        let payload = self
            .backend
            .list_rooms(&request)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Huya, e))?;
        let resp: HuyaListResponse = decode_payload(LivePlatform::Huya, "room list", payload)?;

        if resp.error != 0 {
            return Err(Self::make_error(
                resp.msg.unwrap_or_else(|| format!("API error code {}", resp.error)),
                None,
            ));
        }
        let raw_items = resp
            .data
            .ok_or_else(|| Self::make_error("no data in response", None))?;

        let returned = raw_items.len();
        let items: Vec<_> = raw_items
            .into_iter()
            .filter_map(|item| Self::map_item(item).normalize(LivePlatform::Huya))
            .collect();

        let report = PageReport::new(cursor, self.page_size, returned);
        Ok(RoomPage {
            items,
            next_cursor: self.strategy.next_cursor(&report),
            has_more: self.strategy.has_more(&report),
        })
    }

    async fn resolve_stream(&self, room_id: &str, quality: &str) -> AppResult<StreamDescriptor> {
        let payload = self
            .backend
            .resolve_stream(LivePlatform::Huya, room_id, quality)
            .await
            .map_err(|e| stream_failure(LivePlatform::Huya, room_id, e))?;
        let resp: HuyaStreamResponse = decode_payload(LivePlatform::Huya, "stream", payload)
            .map_err(|e| stream_transient(LivePlatform::Huya, room_id, e.to_string()))?;

        if !resp.is_live {
            return Err(stream_offline(LivePlatform::Huya, room_id, "主播未开播"));
        }

        let variants: Vec<StreamVariant> = resp
            .flv_tx_urls
            .into_iter()
            .filter(|entry| !entry.url.is_empty())
            .map(|entry| StreamVariant {
                quality: entry.quality,
                bit_rate: entry.bit_rate.and_then(|b| u64::try_from(b).ok()),
                url: entry.url,
            })
            .collect();
        let primary_url = resp.selected_url.filter(|url| !url.is_empty());

        if variants.is_empty() && primary_url.is_none() {
            return Err(stream_transient(
                LivePlatform::Huya,
                room_id,
                "no playable stream URL",
            ));
        }

        Ok(StreamDescriptor {
            variants,
            primary_url,
            format_hints: vec!["flv".to_string()],
            upstream_url: None,
            delivery: Delivery::RequiresProxy,
        })
    }

    async fn refresh_status(&self, room_id: &str) -> AppResult<StatusUpdate> {
        let payload = self
            .backend
            .room_status(LivePlatform::Huya, room_id)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Huya, e))?;
        let resp: MpApiResponse = decode_payload(LivePlatform::Huya, "room status", payload)?;

        if resp.status != 200 {
            return Err(Self::make_error(
                format!("API error: {}", resp.message),
                None,
            ));
        }
        let data = resp
            .data
            .ok_or_else(|| Self::make_error("no data in response", None))?;

        let live_status = Self::parse_live_status(&data);
        let (nickname, avatar_url) = match data.profile_info {
            Some(profile) => (profile.nick, profile.avatar180),
            None => (None, None),
        };
        Ok(StatusUpdate {
            live_status,
            nickname,
            room_title: data.live_data.and_then(|d| d.introduction),
            avatar_url,
        })
    }
}
