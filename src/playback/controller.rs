use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::format::{ContainerFormat, FormatClassifier};
use super::proxy::{ProxySession, ProxyTicket};
use crate::config::PlaybackConfig;
use crate::error::{AppError, AppResult, UnavailableReason};
use crate::external::live::{
    AdapterRegistry, Delivery, LivePlatform, StreamDescriptor, StreamVariant,
};

/// A URL the player can open, plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSource {
    pub platform: LivePlatform,
    pub room_id: String,
    pub url: String,
    pub format: ContainerFormat,
    /// Remote URL behind `url` when the two differ
    pub upstream_url: Option<String>,
    /// Whether `url` is served by this process's relay
    pub proxied: bool,
}

/// Caller-side retry policy for [`StreamController::resolve_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            delay: Duration::from_secs(1),
        }
    }
}

impl From<&PlaybackConfig> for RetryPolicy {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Resolves rooms to playable URLs and keeps the relay pointed at the
/// current one.
pub struct StreamController {
    adapters: AdapterRegistry,
    proxy: Arc<ProxySession>,
    default_quality: String,
}

impl StreamController {
    pub fn new(adapters: AdapterRegistry, proxy: Arc<ProxySession>) -> Self {
        Self::with_config(adapters, proxy, &PlaybackConfig::default())
    }

    pub fn with_config(
        adapters: AdapterRegistry,
        proxy: Arc<ProxySession>,
        config: &PlaybackConfig,
    ) -> Self {
        Self {
            adapters,
            proxy,
            default_quality: config.default_quality.clone(),
        }
    }

    pub fn proxy(&self) -> &Arc<ProxySession> {
        &self.proxy
    }

    /// Resolves a room once. A previously served stream stops being served
    /// as soon as a new source is ready.
    ///
    /// A call overtaken by a later `resolve` or [`release`](Self::release)
    /// fails with [`UnavailableReason::Superseded`] and leaves the relay to
    /// the newer request.
    pub async fn resolve(
        &self,
        platform: LivePlatform,
        room_id: &str,
        quality: Option<&str>,
    ) -> AppResult<PlaybackSource> {
        let ticket = self.proxy.claim();
        let adapter = self.adapters.require(platform)?;
        let quality = quality.unwrap_or(&self.default_quality);

        tracing::debug!(%platform, room_id, quality, "Resolving stream");
        let descriptor = adapter.resolve_stream(room_id, quality).await?;

        let chosen = choose_url(&descriptor, quality).ok_or_else(|| AppError::StreamUnavailable {
            platform,
            room_id: room_id.to_string(),
            reason: UnavailableReason::Transient,
            message: "no usable stream URL".to_string(),
        })?;

        let classifier = FormatClassifier::for_platform(platform);
        let candidates = std::iter::once(chosen.as_str())
            .chain(descriptor.format_hints.iter().map(String::as_str));
        let format = classifier.classify_or_default(candidates);

        let needs_proxy = descriptor.delivery == Delivery::RequiresProxy && !is_loopback(&chosen);
        if !needs_proxy {
            // the player reads the new URL directly; drop whatever the relay served
            if !self.proxy.stop_for(ticket).await {
                return Err(superseded(platform, room_id));
            }
            let upstream_url = descriptor.upstream_url.filter(|u| *u != chosen);
            tracing::info!(%platform, room_id, %format, "Stream resolved");
            return Ok(PlaybackSource {
                platform,
                room_id: room_id.to_string(),
                url: chosen,
                format,
                upstream_url,
                proxied: false,
            });
        }

        let local_url = self
            .proxy
            .serve(ticket, &chosen)
            .await
            .map_err(|e| {
                tracing::warn!(%platform, room_id, error = %e, "Relay unavailable for stream");
                AppError::StreamUnavailable {
                    platform,
                    room_id: room_id.to_string(),
                    reason: UnavailableReason::Transient,
                    message: e.to_string(),
                }
            })?
            .ok_or_else(|| superseded(platform, room_id))?;

        tracing::info!(%platform, room_id, %format, "Stream resolved through relay");
        Ok(PlaybackSource {
            platform,
            room_id: room_id.to_string(),
            url: local_url,
            format,
            upstream_url: Some(chosen),
            proxied: true,
        })
    }

    /// [`resolve`](Self::resolve) with a fixed-delay retry. Offline rooms
    /// and superseded requests fail immediately.
    pub async fn resolve_with_retry(
        &self,
        platform: LivePlatform,
        room_id: &str,
        quality: Option<&str>,
        policy: RetryPolicy,
    ) -> AppResult<PlaybackSource> {
        let mut attempt = 0;
        loop {
            match self.resolve(platform, room_id, quality).await {
                Ok(source) => return Ok(source),
                Err(e) if e.is_offline() || e.is_superseded() || attempt >= policy.max_retries => {
                    return Err(e);
                }
                Err(e) => {
                    attempt += 1;
                    tracing::warn!(
                        %platform,
                        room_id,
                        attempt,
                        error = %e,
                        "Stream resolution failed, retrying"
                    );
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    /// Stops the relay. Never fails.
    pub async fn stop(&self) {
        self.proxy.stop().await;
    }

    /// Supersedes in-flight resolutions right away and returns the ticket
    /// whose [`stop_for`](Self::stop_for) tears the relay down later, unless
    /// a newer resolution claimed it first.
    pub fn release(&self) -> ProxyTicket {
        self.proxy.claim()
    }

    pub async fn stop_for(&self, ticket: ProxyTicket) -> bool {
        self.proxy.stop_for(ticket).await
    }
}

fn superseded(platform: LivePlatform, room_id: &str) -> AppError {
    tracing::debug!(%platform, room_id, "Stream resolution superseded");
    AppError::StreamUnavailable {
        platform,
        room_id: room_id.to_string(),
        reason: UnavailableReason::Superseded,
        message: "superseded by a newer request".to_string(),
    }
}

/// Exact label match first, then the highest bit rate, then the primary URL.
fn choose_url(descriptor: &StreamDescriptor, quality: &str) -> Option<String> {
    select_variant(&descriptor.variants, quality)
        .map(|variant| variant.url.clone())
        .or_else(|| descriptor.primary_url.clone())
        .filter(|url| !url.trim().is_empty())
}

pub fn select_variant<'a>(variants: &'a [StreamVariant], quality: &str) -> Option<&'a StreamVariant> {
    if let Some(exact) = variants.iter().find(|v| v.quality == quality) {
        return Some(exact);
    }
    variants.iter().fold(None, |best: Option<&StreamVariant>, v| match best {
        Some(b) if b.bit_rate.unwrap_or(0) >= v.bit_rate.unwrap_or(0) => Some(b),
        _ => Some(v),
    })
}

/// Whether the URL points at this machine, i.e. is already relayed.
pub fn is_loopback(url: &str) -> bool {
    let rest = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = match authority.strip_prefix('[') {
        Some(v6) => v6.split(']').next().unwrap_or_default(),
        None => authority.split(':').next().unwrap_or_default(),
    };
    matches!(
        host.to_ascii_lowercase().as_str(),
        "127.0.0.1" | "localhost" | "::1"
    )
}
