//! Configuration validation logic
//!
//! Each section checks its own ranges; [`Settings::validate`] runs them all
//! and stops at the first failure.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DanmakuConfig, FollowsConfig, LoggerSettings, PagerConfig, PlaybackConfig, Settings,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Upper bound on any single page request
const MAX_PAGE_SIZE: usize = 500;

/// Upper bound on retries; the resolution contract allows a single one
const MAX_RETRIES: u32 = 1;

impl LoggerSettings {
    /// # Validation Rules
    /// - Level must be one of trace, debug, info, warn, error
    /// - File path must not be empty when file output is enabled
    /// - Format must be full, compact or json
    /// - Rotation keeps at least one file of at least 1024 bytes
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::validation(
                "logger.level",
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        let format = self.file.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format",
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        if self.file.rotation.max_size < 1024 {
            return Err(ConfigError::validation(
                "logger.file.rotation.max_size",
                "Rotation size must be at least 1024 bytes.",
            ));
        }
        if self.file.rotation.max_files == 0 {
            return Err(ConfigError::validation(
                "logger.file.rotation.max_files",
                "At least one rotated file must be kept.",
            ));
        }

        Ok(())
    }
}

impl PagerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("pager.huya_page_size", self.huya_page_size),
            ("pager.douyu_page_size", self.douyu_page_size),
            ("pager.douyin_page_size", self.douyin_page_size),
            ("pager.bilibili_page_size", self.bilibili_page_size),
        ];
        for (field, size) in sizes {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(ConfigError::validation(
                    field,
                    format!("Page size must be between 1 and {}, got {}.", MAX_PAGE_SIZE, size),
                ));
            }
        }
        Ok(())
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_quality.trim().is_empty() {
            return Err(ConfigError::validation(
                "playback.default_quality",
                "Default quality label cannot be empty.",
            ));
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ConfigError::validation(
                "playback.max_retries",
                format!(
                    "At most {} retry is allowed, got {}.",
                    MAX_RETRIES, self.max_retries
                ),
            ));
        }
        Ok(())
    }
}

impl DanmakuConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_capacity == 0 {
            return Err(ConfigError::validation(
                "danmaku.buffer_capacity",
                "Buffer capacity must be greater than 0.",
            ));
        }
        Ok(())
    }
}

impl FollowsConfig {
    /// # Validation Rules
    /// - Store path must not be empty
    /// - Refresh cron must have six or seven fields when refresh is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_path.trim().is_empty() {
            return Err(ConfigError::validation(
                "follows.store_path",
                "Follow store path cannot be empty.",
            ));
        }

        if self.refresh_enabled {
            let fields = self.refresh_cron.split_whitespace().count();
            if !(6..=7).contains(&fields) {
                return Err(ConfigError::validation(
                    "follows.refresh_cron",
                    format!(
                        "Cron expression '{}' must have 6 or 7 fields (seconds first).",
                        self.refresh_cron
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.pager.validate()?;
        self.playback.validate()?;
        self.danmaku.validate()?;
        self.follows.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_logger_settings_invalid_level() {
        let mut settings = LoggerSettings::default();
        settings.level = "verbose".to_string();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "logger.level"));
    }

    #[test]
    fn test_logger_settings_levels_case_insensitive() {
        let mut settings = LoggerSettings::default();
        settings.level = "WARN".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_logger_settings_file_enabled_empty_path() {
        let mut settings = LoggerSettings::default();
        settings.file.enabled = true;
        settings.file.path = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_logger_settings_no_output() {
        let mut settings = LoggerSettings::default();
        settings.console.enabled = false;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_pager_zero_page_size() {
        let config = PagerConfig {
            douyin_page_size: 0,
            ..PagerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pager.douyin_page_size"));
    }

    #[test]
    fn test_playback_retry_limit() {
        let config = PlaybackConfig {
            max_retries: 3,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_danmaku_zero_capacity() {
        assert!(DanmakuConfig { buffer_capacity: 0 }.validate().is_err());
    }

    #[test]
    fn test_follows_cron_field_count() {
        let mut config = FollowsConfig {
            refresh_cron: "*/5 * * * *".to_string(),
            ..FollowsConfig::default()
        };
        assert!(config.validate().is_err());

        config.refresh_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_invalid_section_propagates() {
        let mut settings = Settings::default();
        settings.follows.store_path = String::new();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("follows.store_path"));
    }
}
