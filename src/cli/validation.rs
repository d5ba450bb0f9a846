//! Value parsers for CLI arguments that clap cannot check on its own.

use std::fs;
use std::path::PathBuf;

use crate::external::live::LivePlatform;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }
    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }
    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{}': {}", path_str, e)),
    }
}

pub fn validate_platform(value: &str) -> Result<LivePlatform, String> {
    value.parse()
}

/// Room ids are opaque but never blank and never contain whitespace.
pub fn validate_room_id(value: &str) -> Result<String, String> {
    let id = value.trim();
    if id.is_empty() {
        return Err("Room id cannot be empty".to_string());
    }
    if id.chars().any(char::is_whitespace) {
        return Err(format!("Room id cannot contain whitespace: '{}'", id));
    }
    Ok(id.to_string())
}
