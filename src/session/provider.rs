use std::sync::Arc;

use async_trait::async_trait;

use super::token::SessionToken;
use crate::error::{AppError, AppResult};
use crate::external::backend::LiveBackend;
use crate::external::live::LivePlatform;

/// Supplies the session token some platforms require before listing rooms.
#[async_trait]
pub trait SessionTokenProvider: Send + Sync {
    async fn acquire(&self, platform: LivePlatform) -> AppResult<SessionToken>;
}

/// Token provider backed by the platform backend.
pub struct BackendTokenProvider {
    backend: Arc<dyn LiveBackend>,
}

impl BackendTokenProvider {
    pub fn new(backend: Arc<dyn LiveBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SessionTokenProvider for BackendTokenProvider {
    async fn acquire(&self, platform: LivePlatform) -> AppResult<SessionToken> {
        let raw = self
            .backend
            .acquire_session_token(platform)
            .await
            .map_err(|e| AppError::TokenUnavailable {
                platform,
                message: e.to_string(),
            })?;

        let token = SessionToken::new(raw);
        if token.is_empty() {
            return Err(AppError::TokenUnavailable {
                platform,
                message: "backend returned an empty token".to_string(),
            });
        }

        tracing::debug!(%platform, "Session token acquired");
        Ok(token)
    }
}
