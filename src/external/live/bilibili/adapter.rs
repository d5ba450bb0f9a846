use std::sync::Arc;

use async_trait::async_trait;

use super::types::{BiliListData, BiliListRoom, BiliResponse, BiliRoomData, BiliStreamInfo};
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

pub const BILIBILI_PAGE_SIZE: usize = 30;

const STATUS_LIVE: i32 = 2;

pub struct BilibiliLive {
    backend: Arc<dyn LiveBackend>,
    page_size: usize,
    strategy: ServerFlagStrategy,
}

impl BilibiliLive {
    pub fn new(backend: Arc<dyn LiveBackend>) -> Self {
        Self::with_page_size(backend, BILIBILI_PAGE_SIZE)
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
            platform: LivePlatform::Bilibili,
            message: message.into(),
            source,
        }
    }

    fn map_room(room: BiliListRoom) -> RawStreamerFields {
        let viewer_count = room
            .watched_show
            .and_then(|w| w.text_small)
            .or_else(|| room.online.map(|o| o.to_string()));
        RawStreamerFields {
            room_id: room.roomid,
            title: room.title,
            nickname: room.uname,
            avatar: room.face,
            room_cover: room.cover.or(room.user_cover).or(room.system_cover),
            viewer_count,
        }
    }
}

#[async_trait]
impl PlatformAdapter for BilibiliLive {
    fn platform(&self) -> LivePlatform {
        LivePlatform::Bilibili
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn initial_cursor(&self) -> Cursor {
        Cursor::Page(1)
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
            platform: LivePlatform::Bilibili,
            message: "w_webid required for room list".to_string(),
        })?;

        let request = ListRoomsRequest {
            platform: LivePlatform::Bilibili,
            category: category.clone(),
            cursor,
            page_size: self.page_size,
            session_token: Some(token.as_str().to_string()),
        };
        let payload = self
            .backend
            .list_rooms(&request)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Bilibili, e))?;
        let resp: BiliResponse<BiliListData> =
            decode_payload(LivePlatform::Bilibili, "room list", payload)?;

        if resp.code != 0 {
            return Err(Self::make_error(
                format!(
                    "list_rooms API error code {}: {}",
                    resp.code,
                    resp.message.unwrap_or_default()
                ),
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
            .filter_map(|room| Self::map_room(room).normalize(LivePlatform::Bilibili))
            .collect();

        let report = PageReport::new(cursor, self.page_size, returned)
            .with_server_flag(data.has_more.map(|flag| flag != 0), None);
        Ok(RoomPage {
            items,
            next_cursor: self.strategy.next_cursor(&report),
            has_more: self.strategy.has_more(&report),
        })
    }

    async fn resolve_stream(&self, room_id: &str, quality: &str) -> AppResult<StreamDescriptor> {
        let payload = self
            .backend
            .resolve_stream(LivePlatform::Bilibili, room_id, quality)
            .await
            .map_err(|e| stream_failure(LivePlatform::Bilibili, room_id, e))?;
        let info: BiliStreamInfo = decode_payload(LivePlatform::Bilibili, "stream", payload)
            .map_err(|e| stream_transient(LivePlatform::Bilibili, room_id, e.to_string()))?;

        if info.status != Some(STATUS_LIVE) {
            return Err(stream_offline(
                LivePlatform::Bilibili,
                room_id,
                info.error_message
                    .unwrap_or_else(|| "主播未开播".to_string()),
            ));
        }

        let Some(stream_url) = info.stream_url.filter(|url| !url.is_empty()) else {
            return Err(stream_transient(
                LivePlatform::Bilibili,
                room_id,
                info.error_message
                    .unwrap_or_else(|| "no stream URL in response".to_string()),
            ));
        };

        let mut format_hints: Vec<String> = info
            .available_streams
            .unwrap_or_default()
            .into_iter()
            .filter_map(|variant| variant.format)
            .collect();
        format_hints.dedup();
        format_hints.extend(info.upstream_url.iter().cloned());

        Ok(StreamDescriptor {
            variants: Vec::new(),
            primary_url: Some(stream_url),
            format_hints,
            upstream_url: info.upstream_url,
            delivery: Delivery::AlreadyLocal,
        })
    }

    async fn refresh_status(&self, room_id: &str) -> AppResult<StatusUpdate> {
        let payload = self
            .backend
            .room_status(LivePlatform::Bilibili, room_id)
            .await
            .map_err(|e| fetch_failure(LivePlatform::Bilibili, e))?;
        let resp: BiliResponse<BiliRoomData> =
            decode_payload(LivePlatform::Bilibili, "room status", payload)?;

        if resp.code != 0 {
            return Err(Self::make_error(
                format!("refresh_status({}) API error code: {}", room_id, resp.code),
                None,
            ));
        }
        let d = resp.data.ok_or_else(|| {
            Self::make_error(format!("refresh_status({}) no data in response", room_id), None)
        })?;

        Ok(StatusUpdate {
            live_status: match d.live_status {
                1 => LiveStatus::Live,
                2 => LiveStatus::Replay,
                _ => LiveStatus::Offline,
            },
            nickname: d.uname,
            room_title: d.title,
            avatar_url: d.face,
        })
    }
}
