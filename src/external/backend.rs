//! Seams to the platform backend that performs the actual network work.
//!
//! Every call returns raw platform payloads as [`serde_json::Value`]; the
//! per-platform adapters own the decoding.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::live::{Category, Cursor, LivePlatform};

/// Structured classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The room exists but is not broadcasting.
    NotLive,
    RoomNotFound,
    RateLimited,
    Timeout,
    Unauthorized,
    /// The backend answered with something it could not interpret.
    Malformed,
    Other,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendErrorKind::NotLive => "not live",
            BackendErrorKind::RoomNotFound => "room not found",
            BackendErrorKind::RateLimited => "rate limited",
            BackendErrorKind::Timeout => "timeout",
            BackendErrorKind::Unauthorized => "unauthorized",
            BackendErrorKind::Malformed => "malformed response",
            BackendErrorKind::Other => "backend error",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_live(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotLive, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    /// Whether the failure means the room is definitively offline.
    pub fn is_offline(&self) -> bool {
        matches!(
            self.kind,
            BackendErrorKind::NotLive | BackendErrorKind::RoomNotFound
        )
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Parameters for one room-list page request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRoomsRequest {
    pub platform: LivePlatform,
    pub category: Category,
    pub cursor: Cursor,
    pub page_size: usize,
    pub session_token: Option<String>,
}

#[async_trait]
pub trait LiveBackend: Send + Sync {
    /// Fetches an anti-bot token for platforms that gate list access on one.
    async fn acquire_session_token(&self, platform: LivePlatform) -> BackendResult<String>;

    async fn list_rooms(&self, request: &ListRoomsRequest) -> BackendResult<Value>;

    async fn resolve_stream(
        &self,
        platform: LivePlatform,
        room_id: &str,
        quality: &str,
    ) -> BackendResult<Value>;

    async fn room_status(&self, platform: LivePlatform, room_id: &str) -> BackendResult<Value>;
}

/// Local relay that re-serves a remote stream under a loopback URL.
#[async_trait]
pub trait ProxyRelay: Send + Sync {
    async fn set_target(&self, upstream_url: &str) -> BackendResult<()>;

    /// Starts serving, replacing any previous server, and returns the local URL.
    async fn start(&self) -> BackendResult<String>;

    async fn stop(&self) -> BackendResult<()>;
}

/// Controls the backend's per-room chat listeners.
#[async_trait]
pub trait DanmakuBackend: Send + Sync {
    async fn start_listener(&self, platform: LivePlatform, room_id: &str) -> BackendResult<()>;

    async fn stop_listener(&self, platform: LivePlatform, room_id: &str) -> BackendResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_kinds() {
        assert!(BackendError::not_live("x").is_offline());
        assert!(BackendError::new(BackendErrorKind::RoomNotFound, "x").is_offline());
        assert!(!BackendError::new(BackendErrorKind::Timeout, "x").is_offline());
        assert!(!BackendError::other("主播未开播").is_offline());
    }

    #[test]
    fn test_display() {
        let err = BackendError::new(BackendErrorKind::RateLimited, "HTTP 429");
        assert_eq!(err.to_string(), "rate limited: HTTP 429");
    }
}
