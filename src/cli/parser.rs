//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::external::live::LivePlatform;

/// Live-room aggregation toolkit
#[derive(Parser, Debug)]
#[command(name = "livehub")]
#[command(about = "Inspect livehub configuration and manage the follow list")]
#[command(long_about = "
livehub aggregates rooms, chat and playback URLs from Huya, Douyu, Douyin
and Bilibili. This binary validates configuration and manages the local
follow list used by the desktop shell.

EXAMPLES:
    # Validate configuration and print a summary
    livehub check

    # Use a single configuration file
    livehub --config /path/to/livehub.toml check

    # List followed streamers, pinned first
    livehub follows list

    # Pin or remove an entry
    livehub follows pin douyu 9999
    livehub follows remove huya 660000
")]
#[command(version = crate::build::CLAP_LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Loads this single TOML file instead of the layered config directory.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Available values: development (dev), staging (stage), production (prod), test
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log level override, takes precedence over --verbose and --quiet
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Validate configuration and print a summary (default)
    Check,

    /// Manage the follow list
    Follows {
        #[command(subcommand)]
        action: FollowsAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum FollowsAction {
    /// List followed streamers, pinned first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Stop following a streamer
    Remove {
        #[arg(value_parser = super::validation::validate_platform)]
        platform: LivePlatform,
        #[arg(value_parser = super::validation::validate_room_id)]
        id: String,
    },

    /// Pin a streamer to the top of the list
    Pin {
        #[arg(value_parser = super::validation::validate_platform)]
        platform: LivePlatform,
        #[arg(value_parser = super::validation::validate_room_id)]
        id: String,
    },

    /// Unpin a streamer
    Unpin {
        #[arg(value_parser = super::validation::validate_platform)]
        platform: LivePlatform,
        #[arg(value_parser = super::validation::validate_room_id)]
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["livehub", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["livehub"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_follows_pin() {
        let cli = Cli::try_parse_from(["livehub", "follows", "pin", "Douyu", "9999"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Follows {
                action: FollowsAction::Pin {
                    platform: LivePlatform::Douyu,
                    id: "9999".to_string(),
                }
            })
        );
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let err = Cli::try_parse_from(["livehub", "follows", "remove", "twitch", "1"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_env_alias() {
        let cli = Cli::try_parse_from(["livehub", "--env", "prod", "check"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
        assert_eq!(cli.command, Some(Commands::Check));
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["livehub", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
