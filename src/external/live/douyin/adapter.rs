use std::sync::Arc;

use async_trait::async_trait;

use super::types::{DouyinEnterRoomResp, DouyinListResponse, DouyinListRoom, DouyinStreamInfo};
use crate::error::{AppError, AppResult};
use crate::external::backend::{ListRoomsRequest, LiveBackend};
use crate::external::live::pagination::{
    Cursor, PageReport, PaginationStrategy, ServerFlagStrategy,
};
use crate::external::live::platform::LivePlatform;
use crate::external::live::provider::{
    PlatformAdapter, decode_payload, fetch_failure, stream_failure, stream_offline,
    stream_transient,
};
use crate::external::live::types::{
    Category, Delivery, LiveStatus, RawStreamerFields, RoomPage, StatusUpdate, StreamDescriptor,
};
use crate::session::SessionToken;

pub const DOUYIN_PAGE_SIZE: usize = 15;

const STATUS_LIVE: i32 = 2;

pub struct DouyinLive {
    backend: Arc<dyn LiveBackend>,
    page_size: usize,
    strategy: ServerFlagStrategy,
}

impl DouyinLive {
    pub fn new(backend: Arc<dyn LiveBackend>) -> Self {
        Self::with_page_size(backend, DOUYIN_PAGE_SIZE)
    }

    pub fn with_page_size(backend: Arc<dyn LiveBackend>, page_size: usize) -> Self {
        Self {
            backend,
            page_size,
            strategy: ServerFlagStrategy,
        }
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::AdapterFetch {
            platform: LivePlatform::Douyin,
            message: message.into(),
            source,
        }
    }

    fn map_room(room: DouyinListRoom) -> RawStreamerFields {
        RawStreamerFields {
            room_id: room.web_rid.or(room.room_id),
            title: room.title,
            nickname: room.owner_nickname,
            avatar: room.avatar_url,
            room_cover: room.cover_url,
            viewer_count: room.user_count_str,
        }
    }
}

#[async_trait]
impl PlatformAdapter for DouyinLive {
    fn platform(&self) -> LivePlatform {
        LivePlatform::Douyin
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn initial_cursor(&self) -> Cursor {
        Cursor::Offset(0)
    }

    fn requires_session_token(&self) -> bool {
        true
    }

    async fn list_rooms(
        &self,
        category: &Category,
        cursor: Cursor,
        token: Option<&SessionToken>,
    ) -> AppResult<RoomPage> {
        let token = token.ok_or_else(|| AppError::TokenUnavailable {
            platform: LivePlatform::Douyin,
            message: "msToken required for room list".to_string(),
        })?;

        let request = ListRoomsRequest {
            platform: LivePlatform::Douyin,
            category: category.clone(),
            cursor,
            page_size: self.page_size,
            session_token: Some(token.as_str().to_string()),
        };
        let payload = self
            .backend
            .list_rooms(&request)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Douyin, e))?;
        let resp: DouyinListResponse = decode_payload(LivePlatform::Douyin, "room list", payload)?;

        let returned = resp.rooms.len();
        let items: Vec<_> = resp
            .rooms
            .into_iter()
            .filter_map(|room| Self::map_room(room).normalize(LivePlatform::Douyin))
            .collect();

        let report = PageReport::new(cursor, self.page_size, returned)
            .with_server_flag(resp.has_more, resp.next_offset);
        Ok(RoomPage {
            items,
            next_cursor: self.strategy.next_cursor(&report),
            has_more: self.strategy.has_more(&report),
        })
    }

    async fn resolve_stream(&self, room_id: &str, quality: &str) -> AppResult<StreamDescriptor> {
        let payload = self
            .backend
            .resolve_stream(LivePlatform::Douyin, room_id, quality)
            .await
            .map_err(|e| stream_failure(LivePlatform::Douyin, room_id, e))?;
        let info: DouyinStreamInfo = decode_payload(LivePlatform::Douyin, "stream", payload)
            .map_err(|e| stream_transient(LivePlatform::Douyin, room_id, e.to_string()))?;

        if info.status != Some(STATUS_LIVE) {
            return Err(stream_offline(
                LivePlatform::Douyin,
                room_id,
                info.error_message
                    .unwrap_or_else(|| "主播未开播".to_string()),
            ));
        }

        let Some(stream_url) = info.stream_url.filter(|url| !url.is_empty()) else {
            return Err(stream_transient(
                LivePlatform::Douyin,
                room_id,
                info.error_message
                    .unwrap_or_else(|| "no stream URL in response".to_string()),
            ));
        };

        Ok(StreamDescriptor {
            variants: Vec::new(),
            primary_url: Some(stream_url),
            format_hints: info.upstream_url.iter().cloned().collect(),
            upstream_url: info.upstream_url,
            delivery: Delivery::AlreadyLocal,
        })
    }

    async fn refresh_status(&self, room_id: &str) -> AppResult<StatusUpdate> {
        let payload = self
            .backend
            .room_status(LivePlatform::Douyin, room_id)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Douyin, e))?;
        let data: DouyinEnterRoomResp =
            decode_payload(LivePlatform::Douyin, "room status", payload)?;

        if data.status_code != 0 {
            return Err(Self::make_error(
                format!("refresh_status({}) API error code: {}", room_id, data.status_code),
                None,
            ));
        }

        let room_data = data.data.ok_or_else(|| {
            Self::make_error(format!("refresh_status({}) no data in response", room_id), None)
        })?;
        let room = room_data.data.and_then(|d| d.into_iter().next());
        let is_living = room_data.room_status == Some(0);

        let owner = room_data
            .user
            .or_else(|| room.as_ref().and_then(|r| r.owner.clone()));
        let avatar_url = owner
            .as_ref()
            .and_then(|o| o.avatar_thumb.as_ref())
            .and_then(|a| a.url_list.as_ref())
            .and_then(|l| l.first().cloned());

        Ok(StatusUpdate {
            live_status: if is_living {
                LiveStatus::Live
            } else {
                LiveStatus::Offline
            },
            nickname: owner.and_then(|o| o.nickname),
            room_title: room.and_then(|r| r.title).filter(|t| !t.is_empty()),
            avatar_url,
        })
    }
}
