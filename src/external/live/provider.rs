use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::pagination::Cursor;
use super::platform::LivePlatform;
use super::types::{Category, RoomPage, StatusUpdate, StreamDescriptor};
use crate::error::{AppError, AppResult, UnavailableReason};
use crate::external::backend::BackendError;
use crate::session::SessionToken;

/// Per-platform knowledge: request shapes, response normalization, and
/// pagination rules.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> LivePlatform;

    fn page_size(&self) -> usize;

    fn initial_cursor(&self) -> Cursor;

    fn requires_session_token(&self) -> bool {
        false
    }

    async fn list_rooms(
        &self,
        category: &Category,
        cursor: Cursor,
        token: Option<&SessionToken>,
    ) -> AppResult<RoomPage>;

    async fn resolve_stream(&self, room_id: &str, quality: &str) -> AppResult<StreamDescriptor>;

    async fn refresh_status(&self, room_id: &str) -> AppResult<StatusUpdate>;
}

pub(super) fn decode_payload<T: DeserializeOwned>(
    platform: LivePlatform,
    what: &str,
    payload: Value,
) -> AppResult<T> {
    serde_json::from_value(payload).map_err(|e| AppError::AdapterFetch {
        platform,
        message: format!("invalid {} payload: {}", what, e),
        source: Some(e.into()),
    })
}

pub(super) fn fetch_failure(platform: LivePlatform, error: BackendError) -> AppError {
    AppError::AdapterFetch {
        platform,
        message: error.to_string(),
        source: Some(error.into()),
    }
}

pub(super) fn stream_failure(platform: LivePlatform, room_id: &str, error: BackendError) -> AppError {
    let reason = if error.is_offline() {
        UnavailableReason::Offline
    } else {
        UnavailableReason::Transient
    };
    AppError::StreamUnavailable {
        platform,
        room_id: room_id.to_string(),
        reason,
        message: error.message,
    }
}

pub(super) fn stream_offline(
    platform: LivePlatform,
    room_id: &str,
    message: impl Into<String>,
) -> AppError {
    AppError::StreamUnavailable {
        platform,
        room_id: room_id.to_string(),
        reason: UnavailableReason::Offline,
        message: message.into(),
    }
}

pub(super) fn stream_transient(
    platform: LivePlatform,
    room_id: &str,
    message: impl Into<String>,
) -> AppError {
    AppError::StreamUnavailable {
        platform,
        room_id: room_id.to_string(),
        reason: UnavailableReason::Transient,
        message: message.into(),
    }
}

/// Accepts numbers or strings for id-like fields.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Int(i64),
        Str(String),
    }

    match Option::<IdValue>::deserialize(deserializer)? {
        Some(IdValue::Int(i)) => Ok(Some(i.to_string())),
        Some(IdValue::Str(s)) => Ok(Some(s)),
        None => Ok(None),
    }
}

/// Accepts numbers, numeric strings, or booleans for counters and flags.
pub(crate) fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountValue {
        Int(u64),
        Float(f64),
        Bool(bool),
        Str(String),
    }

    Ok(match Option::<CountValue>::deserialize(deserializer)? {
        Some(CountValue::Int(i)) => Some(i),
        Some(CountValue::Float(f)) if f >= 0.0 => Some(f as u64),
        Some(CountValue::Bool(b)) => Some(u64::from(b)),
        Some(CountValue::Str(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
