//! Runtime logger configuration, built from the `[logger]` settings section.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Targets that are chatty at debug level and kept at warn regardless of the
/// configured level.
const QUIET_TARGETS: &[&str] = &["tokio_cron_scheduler"];

const MIN_ROTATION_BYTES: u64 = 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub console: ConsoleConfig,
    pub file: FileConfig,
    pub level: String,
}

impl LoggerConfig {
    pub fn new(console: ConsoleConfig, file: FileConfig, level: String) -> Result<Self> {
        let config = Self {
            console,
            file,
            level,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_level(&self.level)?;
        self.file.validate().context("logger.file")?;
        ensure!(
            self.console.enabled || self.file.enabled,
            "console and file output are both disabled"
        );
        Ok(())
    }

    /// `EnvFilter` directive for the configured level.
    pub fn filter_directive(&self) -> String {
        let level = self.level.trim().to_lowercase();
        QUIET_TARGETS
            .iter()
            .fold(level, |directive, target| format!("{},{}=warn", directive, target))
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            level: "info".to_string(),
        }
    }
}

/// Accepts `trace` through `error` in any case.
pub fn parse_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| {
        anyhow!(
            "unknown log level '{}', expected trace, debug, info, warn or error",
            level
        )
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Only honoured when stdout is a terminal
    pub colored: bool,
}

impl ConsoleConfig {
    pub fn new(enabled: bool, colored: bool) -> Self {
        Self { enabled, colored }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::new(true, true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub append: bool,
    pub format: LogFormat,
    pub rotation: RotationConfig,
}

impl FileConfig {
    pub fn new(
        enabled: bool,
        path: PathBuf,
        append: bool,
        format: LogFormat,
        rotation: RotationConfig,
    ) -> Result<Self> {
        let config = Self {
            enabled,
            path,
            append,
            format,
            rotation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Only checked when enabled. The directory is created by the writer.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        ensure!(
            !self.path.as_os_str().is_empty(),
            "a path is required when file output is enabled"
        );
        self.rotation.validate().context("rotation")
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("logs/livehub.log"),
            append: true,
            format: LogFormat::default(),
            rotation: RotationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

impl LogFormat {
    pub const ALL: [LogFormat; 3] = [LogFormat::Full, LogFormat::Compact, LogFormat::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Full => "full",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| anyhow!("unknown log format '{}', expected full, compact or json", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Rotate once the active file reaches this many bytes
    pub max_size: u64,
    /// Rotated files kept besides the active one
    pub max_files: usize,
}

impl RotationConfig {
    pub fn new(max_size: u64, max_files: usize) -> Result<Self> {
        let config = Self {
            max_size,
            max_files,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.max_size >= MIN_ROTATION_BYTES,
            "max_size must be at least {} bytes, got {}",
            MIN_ROTATION_BYTES,
            self.max_size
        );
        ensure!(self.max_files > 0, "max_files must be at least 1");
        Ok(())
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
            max_files: 5,
        }
    }
}
