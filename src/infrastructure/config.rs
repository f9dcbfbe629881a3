//! Configuration file management.
//!
//! Handles loading and creating the TOML configuration file.

use std::fs;
use std::path::Path;

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Slack History Export Configuration
# Auto-generated - edit as needed

[api]
# Slack Web API base URL
base_url = "https://slack.com/api"

# Page size for users, conversations and history listings
page_limit = 200

# Page size for thread replies
replies_limit = 100

[backoff]
# users.list: first wait when rate-limited without Retry-After, doubled up to the max
users_initial_secs = 10
users_max_secs = 120

# History and thread replies: wait when rate-limited without Retry-After
history_wait_secs = 30

# Pause between history pages (milliseconds)
history_page_delay_ms = 1000

# Pause between thread reply pages (seconds, --thread-sleep overrides)
thread_sleep_secs = 0.5

[export]
# Conversation types to list
conversation_types = "public_channel,private_channel,im,mpim"

# Prefix of the timestamped output directory
output_prefix = "output"

# Fixed output directory (optional, --output-dir overrides)
# output_dir = "/custom/path"
"#;

/// Load configuration from an explicit path, or the default location if it exists.
///
/// # Errors
/// Returns error if the file exists but cannot be read or parsed, or if an
/// explicit path does not exist.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return load_config_from_file(path);
    }

    let config_path = AppConfig::default_config_path();
    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    let config = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })?;

    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Write the default configuration file to `path` unless one already exists.
///
/// Returns `true` when a new file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.api.page_limit, 200);
        assert_eq!(config.backoff.users_max_secs, 120);
        assert!((config.backoff.thread_sleep_secs - 0.5).abs() < f64::EPSILON);
        assert!(config.export.output_dir.is_none());
    }

    #[test]
    fn test_ensure_then_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.toml");

        assert!(ensure_config_exists(&config_path).unwrap());
        assert!(!ensure_config_exists(&config_path).unwrap());

        let loaded = load_config(Some(&config_path)).unwrap();
        assert_eq!(loaded.backoff.history_wait_secs, 30);
        assert_eq!(loaded.export.output_prefix, "output");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[api\nbase_url = ").unwrap();

        let err = load_config_from_file(&config_path).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_missing_explicit_path_is_io_error() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
