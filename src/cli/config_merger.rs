//! Applies CLI overrides on top of file-based configuration.

use super::parser::Cli;
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Precedence, highest first: `--log-level`, `--verbose`/`--quiet`, files
/// and `LIVEHUB_*` variables.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base configuration the way the flags in `cli` ask for.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = cli.config.as_ref() {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }
        Ok(Self::new(loader.load()?))
    }

    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
        if let Some(level) = cli.log_level {
            config.logger.level = level.as_str().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}
