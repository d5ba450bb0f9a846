//! Configuration loader for livehub
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "LIVEHUB_CONFIG_DIR";

/// Environment variable for specific configuration file
const CONFIG_FILE_ENV: &str = "LIVEHUB_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "LIVEHUB";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Configuration loader that handles layered configuration loading
///
/// Sources, lowest priority first:
/// 1. `default.toml` (required)
/// 2. `{environment}.toml` (optional)
/// 3. `local.toml` (optional)
/// 4. `LIVEHUB_*` environment variables
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, layered loading is skipped
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `LIVEHUB_CONFIG_DIR`, `LIVEHUB_CONFIG_FILE` and
    /// `LIVEHUB_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if both `LIVEHUB_CONFIG_DIR` and `LIVEHUB_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let dir_override = std::env::var(CONFIG_DIR_ENV).ok();
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && dir_override.is_some() {
            return Err(ConfigError::ConflictingSources(
                "LIVEHUB_CONFIG_DIR and LIVEHUB_CONFIG_FILE cannot both be set. \
                 Use LIVEHUB_CONFIG_DIR for layered configuration or \
                 LIVEHUB_CONFIG_FILE for a single configuration file."
                    .to_string(),
            ));
        }

        Ok(Self {
            config_dir: dir_override
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Load a single file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Load and validate configuration from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `default.toml` (or the single configured file) is not found
    /// - Configuration parsing fails
    /// - Configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::Deserialize(e.to_string())
        })?;

        settings.validate()?;

        tracing::debug!(
            environment = %self.environment,
            config_dir = %self.config_dir.display(),
            "Configuration loaded"
        );
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = Config::builder();

        let builder = match self.config_file {
            Some(ref config_file) => Self::add_file_source(builder, config_file, true)?,
            None => self.build_layered_config(builder)?,
        };

        // LIVEHUB_PAGER__HUYA_PAGE_SIZE -> pager.huya_page_size
        Self::add_env_source(builder)
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, true)?;

        let env_path = self.config_dir.join(self.environment.overlay_file_name());
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        Ok(builder.add_source(
            File::new(&path.to_string_lossy(), FileFormat::Toml).required(required),
        ))
    }

    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::test_support::ENV_LOCK;
    use tempfile::TempDir;


    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    /// Restores touched environment variables on drop
    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }

        fn clear_livehub(&mut self) {
            self.remove(CONFIG_DIR_ENV);
            self.remove(CONFIG_FILE_ENV);
            self.remove(AppEnvironment::ENV_VAR);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    const DEFAULT_TOML: &str = r#"
[application]
name = "livehub-test"
version = "1.0.0"

[logger]
level = "info"

[pager]
huya_page_size = 120
douyu_page_size = 20

[follows]
store_path = "data/follows.json"
"#;

    #[test]
    fn test_config_loader_new_default() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.config_dir(), Path::new("config"));
        assert!(loader.config_file.is_none());
        assert_eq!(loader.environment(), AppEnvironment::Development);
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.set(CONFIG_DIR_ENV, "/custom/config");
        env.set(CONFIG_FILE_ENV, "/path/to/config.toml");

        match ConfigLoader::new() {
            Err(ConfigError::ConflictingSources(msg)) => {
                assert!(msg.contains("LIVEHUB_CONFIG_DIR"));
                assert!(msg.contains("LIVEHUB_CONFIG_FILE"));
            }
            other => panic!("Expected ConflictingSources, got {:?}", other),
        }
    }

    #[test]
    fn test_config_loader_environment_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();
        env.set(AppEnvironment::ENV_VAR, "production");

        let loader = ConfigLoader::new().expect("Should create loader");
        assert_eq!(loader.environment(), AppEnvironment::Production);
    }

    #[test]
    fn test_load_missing_default_toml() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();
        let temp_dir = setup_config_dir(&[]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        match ConfigLoader::new().unwrap().load() {
            Err(ConfigError::NotFound { path }) => assert!(path.ends_with("default.toml")),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_layers_in_priority_order() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();
        let temp_dir = setup_config_dir(&[
            ("default.toml", DEFAULT_TOML),
            ("production.toml", "[pager]\nhuya_page_size = 60\n"),
            ("local.toml", "[danmaku]\nbuffer_capacity = 50\n"),
        ]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());
        env.set(AppEnvironment::ENV_VAR, "production");
        env.set("LIVEHUB_PAGER__DOUYU_PAGE_SIZE", "40");

        let settings = ConfigLoader::new().unwrap().load().expect("Should load settings");

        assert_eq!(settings.application.name, "livehub-test");
        assert_eq!(settings.pager.huya_page_size, 60);
        assert_eq!(settings.pager.douyu_page_size, 40);
        assert_eq!(settings.pager.bilibili_page_size, 30);
        assert_eq!(settings.danmaku.buffer_capacity, 50);
    }

    #[test]
    fn test_load_single_file_skips_layers() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();
        let temp_dir = setup_config_dir(&[
            ("custom.toml", "[playback]\ndefault_quality = \"蓝光\"\n"),
            ("local.toml", "[playback]\ndefault_quality = \"高清\"\n"),
        ]);

        let settings = ConfigLoader::new()
            .unwrap()
            .with_config_file(temp_dir.path().join("custom.toml"))
            .load()
            .expect("Should load settings");

        assert_eq!(settings.playback.default_quality, "蓝光");
        assert_eq!(settings.application.name, "livehub");
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();
        let temp_dir = setup_config_dir(&[("default.toml", "[danmaku]\nbuffer_capacity = 0\n")]);
        env.set(CONFIG_DIR_ENV, temp_dir.path().to_str().unwrap());

        let err = ConfigLoader::new().unwrap().load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_with_environment_overrides_env_var() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut env = EnvGuard::new();
        env.clear_livehub();
        env.set(AppEnvironment::ENV_VAR, "production");

        let loader = ConfigLoader::new()
            .unwrap()
            .with_environment(AppEnvironment::Test);
        assert_eq!(loader.environment(), AppEnvironment::Test);
    }
}
