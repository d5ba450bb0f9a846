//! Configuration settings structures for livehub
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::external::live::{
    BILIBILI_PAGE_SIZE, DOUYIN_PAGE_SIZE, DOUYU_PAGE_SIZE, HUYA_PAGE_SIZE, LivePlatform,
};
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, RotationConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "livehub".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/livehub.log".to_string()
}

fn default_log_format() -> String {
    "full".to_string()
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

fn default_huya_page_size() -> usize {
    HUYA_PAGE_SIZE
}

fn default_douyu_page_size() -> usize {
    DOUYU_PAGE_SIZE
}

fn default_douyin_page_size() -> usize {
    DOUYIN_PAGE_SIZE
}

fn default_bilibili_page_size() -> usize {
    BILIBILI_PAGE_SIZE
}

fn default_quality() -> String {
    "原画".to_string()
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_buffer_capacity() -> usize {
    crate::danmaku::DEFAULT_CAPACITY
}

fn default_store_path() -> String {
    "data/follows.json".to_string()
}

fn default_refresh_cron() -> String {
    "0 */2 * * * *".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application metadata configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Colors are only emitted when stdout is a terminal
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// Size-based rotation settings for file logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationSettings {
    /// Maximum file size in bytes before rotation
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Maximum number of rotated files to keep
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            max_files: default_max_files(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,

    #[serde(default)]
    pub rotation: RotationSettings,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
            rotation: RotationSettings::default(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert the file representation into the runtime [`LoggerConfig`].
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger", e.to_string()))
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format: LogFormat = self
            .format
            .parse()
            .map_err(|e: anyhow::Error| ConfigError::validation("logger.file.format", e.to_string()))?;
        let rotation = RotationConfig::new(self.rotation.max_size, self.rotation.max_files)
            .map_err(|e| ConfigError::validation("logger.file.rotation", e.to_string()))?;

        FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
            rotation,
        )
        .map_err(|e| ConfigError::validation("logger.file", e.to_string()))
    }
}

// ============================================================================
// Pager Configuration
// ============================================================================

/// Page sizes requested from each platform's room list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerConfig {
    #[serde(default = "default_huya_page_size")]
    pub huya_page_size: usize,

    #[serde(default = "default_douyu_page_size")]
    pub douyu_page_size: usize,

    #[serde(default = "default_douyin_page_size")]
    pub douyin_page_size: usize,

    #[serde(default = "default_bilibili_page_size")]
    pub bilibili_page_size: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            huya_page_size: default_huya_page_size(),
            douyu_page_size: default_douyu_page_size(),
            douyin_page_size: default_douyin_page_size(),
            bilibili_page_size: default_bilibili_page_size(),
        }
    }
}

impl PagerConfig {
    pub fn page_size(&self, platform: LivePlatform) -> usize {
        match platform {
            LivePlatform::Huya => self.huya_page_size,
            LivePlatform::Douyu => self.douyu_page_size,
            LivePlatform::Douyin => self.douyin_page_size,
            LivePlatform::Bilibili => self.bilibili_page_size,
        }
    }
}

// ============================================================================
// Playback Configuration
// ============================================================================

/// Stream resolution defaults and the caller-side retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Quality label requested when the caller does not name one
    #[serde(default = "default_quality")]
    pub default_quality: String,

    /// Retries after the first failed resolution; `Offline` is never retried
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

// ============================================================================
// Danmaku Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanmakuConfig {
    /// Number of messages kept for display; oldest are evicted first
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

impl Default for DanmakuConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

// ============================================================================
// Follows Configuration
// ============================================================================

/// Followed-streamer store and periodic status refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowsConfig {
    /// JSON file holding the followed list
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Six-field cron expression (with seconds) for `refresh_all`
    #[serde(default = "default_refresh_cron")]
    pub refresh_cron: String,

    #[serde(default = "default_true")]
    pub refresh_enabled: bool,
}

impl Default for FollowsConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            refresh_cron: default_refresh_cron(),
            refresh_enabled: default_true(),
        }
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub logger: LoggerSettings,

    #[serde(default)]
    pub pager: PagerConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub danmaku: DanmakuConfig,

    #[serde(default)]
    pub follows: FollowsConfig,
}
