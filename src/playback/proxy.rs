use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::external::backend::ProxyRelay;

/// Target currently served by the local relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveProxy {
    pub upstream_url: String,
    pub local_url: String,
}

/// Claim on the relay taken when a playback request or a room exit begins.
///
/// Only the most recently claimed ticket may change the relay. Work holding
/// an older ticket finishes without touching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyTicket(u64);

/// Owner of the single local relay.
///
/// Target changes and teardown go through one lock, so a `set_target` is
/// always followed by its own `start` and two resolutions can never leave
/// the relay pointing at a mix of their targets.
pub struct ProxySession {
    relay: Arc<dyn ProxyRelay>,
    generation: AtomicU64,
    active: Mutex<Option<ActiveProxy>>,
}

impl ProxySession {
    pub fn new(relay: Arc<dyn ProxyRelay>) -> Self {
        Self {
            relay,
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Supersedes every outstanding ticket.
    pub fn claim(&self) -> ProxyTicket {
        ProxyTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: ProxyTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Points the relay at `upstream_url`, replacing any previous target, and
    /// returns the local URL the player should open.
    ///
    /// Returns `Ok(None)` without touching the relay when `ticket` has been
    /// superseded.
    pub async fn serve(&self, ticket: ProxyTicket, upstream_url: &str) -> AppResult<Option<String>> {
        let mut active = self.active.lock().await;
        if !self.is_current(ticket) {
            tracing::debug!(upstream = %upstream_url, "Relay target dropped, request superseded");
            return Ok(None);
        }

        self.relay
            .set_target(upstream_url)
            .await
            .map_err(|e| AppError::Proxy {
                message: format!("failed to set relay target: {}", e),
                source: Some(e.into()),
            })?;

        let local_url = match self.relay.start().await {
            Ok(url) => url,
            Err(e) => {
                // the relay may still hold the new target; nothing is served
                *active = None;
                return Err(AppError::Proxy {
                    message: format!("failed to start relay: {}", e),
                    source: Some(e.into()),
                });
            }
        };

        if let Some(previous) = active.as_ref() {
            tracing::debug!(
                previous = %previous.upstream_url,
                "Relay target replaced"
            );
        }
        tracing::info!(local_url = %local_url, "Relay serving new target");

        *active = Some(ActiveProxy {
            upstream_url: upstream_url.to_string(),
            local_url: local_url.clone(),
        });
        Ok(Some(local_url))
    }

    /// Stops the relay unconditionally. Safe to call when nothing is served;
    /// failures are logged and swallowed.
    pub async fn stop(&self) {
        let ticket = self.claim();
        self.stop_for(ticket).await;
    }

    /// Stops the relay on behalf of `ticket`. Returns `false`, leaving the
    /// relay alone, when a newer ticket has been claimed since.
    pub async fn stop_for(&self, ticket: ProxyTicket) -> bool {
        let mut active = self.active.lock().await;
        if !self.is_current(ticket) {
            tracing::debug!("Relay stop skipped, superseded by a newer request");
            return false;
        }
        let Some(previous) = active.take() else {
            tracing::trace!("Relay stop requested with no active target");
            return true;
        };

        match self.relay.stop().await {
            Ok(()) => tracing::debug!(upstream = %previous.upstream_url, "Relay stopped"),
            Err(e) => tracing::warn!(
                upstream = %previous.upstream_url,
                error = %e,
                "Failed to stop relay"
            ),
        }
        true
    }

    pub async fn active(&self) -> Option<ActiveProxy> {
        self.active.lock().await.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }
}
