//! Errors raised while locating, reading and validating configuration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required file such as `default.toml` is missing
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// The merged sources do not deserialize into [`Settings`](super::Settings)
    #[error("failed to deserialize configuration: {0}")]
    Deserialize(String),

    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: String, message: String },

    /// `LIVEHUB_APP_ENV` or `--env` names no known environment
    #[error("unknown environment '{value}', expected development, test, staging or production")]
    UnknownEnvironment { value: String },

    /// Two sources that cannot be combined were both given
    #[error("conflicting configuration sources: {0}")]
    ConflictingSources(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Dotted settings key the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid { field, .. } => Some(field.as_str()),
            ConfigError::UnknownEnvironment { .. } => Some("environment"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::validation("pager.huya_page_size", format!("got {}", 0));
        assert_eq!(
            err.to_string(),
            "invalid value for `pager.huya_page_size`: got 0"
        );
        assert_eq!(err.field(), Some("pager.huya_page_size"));
    }

    #[test]
    fn test_not_found_names_the_path() {
        let err = ConfigError::NotFound {
            path: PathBuf::from("config/default.toml"),
        };
        assert!(err.to_string().ends_with("config/default.toml"));
        assert_eq!(err.field(), None);
    }
}
