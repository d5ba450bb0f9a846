use std::fmt;

use thiserror::Error;

use crate::external::live::LivePlatform;

/// Why a stream could not be resolved.
///
/// Callers use this to choose between an offline placeholder and a retry
/// affordance, so adapters must never guess: only a structured "not live" or
/// "room not found" answer from the backend maps to [`UnavailableReason::Offline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The room exists but is not broadcasting, or does not exist at all.
    Offline,
    /// Resolution failed for a reason that may go away on retry.
    Transient,
    /// A newer playback request or a room exit replaced this one.
    Superseded,
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::Offline => write!(f, "offline"),
            UnavailableReason::Transient => write!(f, "transient"),
            UnavailableReason::Superseded => write!(f, "superseded"),
        }
    }
}

/// Application-wide error type.
///
/// Token and stream errors are meant to reach the user. Proxy and persistence
/// errors are produced for logging only: the components that create them
/// absorb them before they can interrupt navigation.
#[derive(Error, Debug)]
pub enum AppError {
    /// A session token could not be acquired; list access is blocked
    #[error("Session token unavailable for {platform}: {message}")]
    TokenUnavailable {
        platform: LivePlatform,
        message: String,
    },

    /// An upstream list or status call failed
    #[error("[{platform}] fetch failed: {message}")]
    AdapterFetch {
        platform: LivePlatform,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The room is not live or resolution failed
    #[error("Stream unavailable for {platform} room {room_id} ({reason}): {message}")]
    StreamUnavailable {
        platform: LivePlatform,
        room_id: String,
        reason: UnavailableReason,
        message: String,
    },

    /// The local relay could not be started or stopped
    #[error("Proxy error: {message}")]
    Proxy {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The follow list could not be saved or loaded
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Whether the error means the room is definitively offline.
    pub fn is_offline(&self) -> bool {
        matches!(
            self,
            AppError::StreamUnavailable {
                reason: UnavailableReason::Offline,
                ..
            }
        )
    }

    /// Whether a newer request made this one obsolete. Never worth a retry.
    pub fn is_superseded(&self) -> bool {
        matches!(
            self,
            AppError::StreamUnavailable {
                reason: UnavailableReason::Superseded,
                ..
            }
        )
    }

    /// Short, user-facing description without source chains.
    pub fn user_message(&self) -> String {
        match self {
            AppError::TokenUnavailable { .. } => {
                "Failed to initialize session. Select the category again.".to_string()
            }
            AppError::StreamUnavailable {
                reason: UnavailableReason::Offline,
                ..
            } => "The streamer is not live.".to_string(),
            AppError::StreamUnavailable { message, .. } => {
                format!("Failed to load the stream: {message}")
            }
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<crate::config::error::ConfigError> for AppError {
    fn from(error: crate::config::error::ConfigError) -> Self {
        AppError::Configuration {
            key: error.field().unwrap_or("settings").to_string(),
            source: error.into(),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
