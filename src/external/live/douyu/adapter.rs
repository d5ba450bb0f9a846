use std::sync::Arc;

use async_trait::async_trait;

use super::types::{DouyuBetardResponse, DouyuListItem, DouyuListResponse, DouyuPlaybackDetails};
use crate::error::{AppError, AppResult};
use crate::external::backend::{ListRoomsRequest, LiveBackend};
use crate::external::live::pagination::{
    CountAwareStrategy, Cursor, PageReport, PaginationStrategy,
};
use crate::external::live::platform::LivePlatform;
use crate::external::live::provider::{
    PlatformAdapter, decode_payload, fetch_failure, stream_failure, stream_transient,
};
use crate::external::live::types::{
    Category, Delivery, LiveStatus, RawStreamerFields, RoomPage, StatusUpdate, StreamDescriptor,
    StreamVariant,
};
use crate::session::SessionToken;

pub const DOUYU_PAGE_SIZE: usize = 20;

pub struct DouyuLive {
    backend: Arc<dyn LiveBackend>,
    page_size: usize,
    strategy: CountAwareStrategy,
}

impl DouyuLive {
    pub fn new(backend: Arc<dyn LiveBackend>) -> Self {
        Self::with_page_size(backend, DOUYU_PAGE_SIZE)
    }

    pub fn with_page_size(backend: Arc<dyn LiveBackend>, page_size: usize) -> Self {
        Self {
            backend,
            page_size,
            strategy: CountAwareStrategy,
        }
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::AdapterFetch {
            platform: LivePlatform::Douyu,
            message: message.into(),
            source,
        }
    }

    fn parse_live_status(show_status: i32, video_loop: i32) -> LiveStatus {
        if show_status == 1 && video_loop == 0 {
            LiveStatus::Live
        } else if show_status == 1 && video_loop == 1 {
            LiveStatus::Replay
        } else {
            LiveStatus::Offline
        }
    }

    /// Third-level categories are paged by 1-indexed page number upstream.
    fn request_cursor(&self, category: &Category, cursor: Cursor) -> Cursor {
        match (category.parent_id.as_ref(), cursor) {
            (Some(_), Cursor::Offset(_)) => {
                let page = cursor.page_number(self.page_size);
                Cursor::Page(u32::try_from(page).unwrap_or(u32::MAX))
            }
            _ => cursor,
        }
    }

    fn map_item(item: DouyuListItem) -> RawStreamerFields {
        RawStreamerFields {
            room_id: item.rid,
            title: item.room_name,
            nickname: item.nickname,
            avatar: item.avatar,
            room_cover: item.room_src,
            viewer_count: item.hn,
        }
    }
}

#[async_trait]
impl PlatformAdapter for DouyuLive {
    fn platform(&self) -> LivePlatform {
        LivePlatform::Douyu
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn initial_cursor(&self) -> Cursor {
        Cursor::Offset(0)
    }

    async fn list_rooms(
        &self,
        category: &Category,
        cursor: Cursor,
        _token: Option<&SessionToken>,
    ) -> AppResult<RoomPage> {
        let request = ListRoomsRequest {
            platform: LivePlatform::Douyu,
            category: category.clone(),
            cursor: self.request_cursor(category, cursor),
            page_size: self.page_size,
            session_token: None,
        };
        let payload = self
            .backend
            .list_rooms(&request)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Douyu, e))?;
        let resp: DouyuListResponse = decode_payload(LivePlatform::Douyu, "room list", payload)?;

        if resp.error != 0 {
            return Err(Self::make_error(
                resp.msg.unwrap_or_else(|| format!("API error code {}", resp.error)),
                None,
            ));
        }
        let data = resp
            .data
            .ok_or_else(|| Self::make_error("no data in response", None))?;

        let returned = data.list.len();
        let items: Vec<_> = data
            .list
            .into_iter()
            .filter_map(|item| Self::map_item(item).normalize(LivePlatform::Douyu))
            .collect();

        let report = PageReport::new(cursor, self.page_size, returned)
            .with_total(data.total)
            .with_page_count(data.page_count);
        Ok(RoomPage {
            items,
            next_cursor: self.strategy.next_cursor(&report),
            has_more: self.strategy.has_more(&report),
        })
    }

    async fn resolve_stream(&self, room_id: &str, quality: &str) -> AppResult<StreamDescriptor> {
        let payload = self
            .backend
            .resolve_stream(LivePlatform::Douyu, room_id, quality)
            .await
            .map_err(|e| stream_failure(LivePlatform::Douyu, room_id, e))?;
        let details: DouyuPlaybackDetails =
            decode_payload(LivePlatform::Douyu, "stream", payload)
                .map_err(|e| stream_transient(LivePlatform::Douyu, room_id, e.to_string()))?;

        let primary_url = details.primary_url.filter(|url| !url.is_empty());
        let variants: Vec<StreamVariant> = details
            .quality_options
            .into_iter()
            .filter(|option| !option.url.is_empty())
            .map(|option| StreamVariant {
                quality: option.quality,
                bit_rate: option.bit_rate,
                url: option.url,
            })
            .collect();

        if primary_url.is_none() && variants.is_empty() {
            return Err(stream_transient(
                LivePlatform::Douyu,
                room_id,
                "斗鱼直播流地址获取为空",
            ));
        }

        Ok(StreamDescriptor {
            variants,
            primary_url,
            format_hints: details.format.into_iter().collect(),
            upstream_url: None,
            delivery: Delivery::RequiresProxy,
        })
    }

    async fn refresh_status(&self, room_id: &str) -> AppResult<StatusUpdate> {
        let payload = self
            .backend
            .room_status(LivePlatform::Douyu, room_id)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Douyu, e))?;
        let resp: DouyuBetardResponse =
            decode_payload(LivePlatform::Douyu, "room status", payload)?;
        let room = resp.room;

        Ok(StatusUpdate {
            live_status: Self::parse_live_status(room.show_status, room.video_loop),
            nickname: room.owner_name,
            room_title: room.room_name,
            avatar_url: room.avatar.and_then(|a| a.get_best()),
        })
    }
}
