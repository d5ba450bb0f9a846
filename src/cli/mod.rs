//! Command-line interface for livehub
//!
//! Parsing, CLI overrides on top of file configuration, and the `check` and
//! `follows` command handlers.

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::execute_command;
pub use parser::{Cli, Commands, Environment, FollowsAction, LogLevel};

use crate::config::error::ConfigError;
use crate::config::settings::Settings;
use crate::logger::{LogLevelHandle, init_logger};

/// Loads configuration files, then applies CLI overrides and validates.
pub fn load_and_merge_config(cli: &Cli) -> Result<Settings, ConfigError> {
    ConfigurationMerger::from_cli(cli)?.merge_cli_args(cli)
}

pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings.logger.clone().into_logger_config()?;
    init_logger(logger_config)
}
