//! Configuration models for API access, backoff and export output.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Slack Web API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Web API, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page size for `users.list`, `conversations.list` and `conversations.history`.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Page size for `conversations.replies`.
    #[serde(default = "default_replies_limit")]
    pub replies_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            replies_limit: default_replies_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://slack.com/api".to_string()
}

const fn default_page_limit() -> u32 {
    200
}

const fn default_replies_limit() -> u32 {
    100
}

/// Rate-limit backoff and request pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// First wait for `users.list` when no `Retry-After` is given.
    #[serde(default = "default_users_initial_secs")]
    pub users_initial_secs: u64,

    /// Cap for the doubling `users.list` wait.
    #[serde(default = "default_users_max_secs")]
    pub users_max_secs: u64,

    /// Wait for history and replies when no `Retry-After` is given.
    #[serde(default = "default_history_wait_secs")]
    pub history_wait_secs: u64,

    /// Pause between history pages, in milliseconds.
    #[serde(default = "default_history_page_delay_ms")]
    pub history_page_delay_ms: u64,

    /// Pause between thread reply pages, in seconds.
    #[serde(default = "default_thread_sleep_secs")]
    pub thread_sleep_secs: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            users_initial_secs: default_users_initial_secs(),
            users_max_secs: default_users_max_secs(),
            history_wait_secs: default_history_wait_secs(),
            history_page_delay_ms: default_history_page_delay_ms(),
            thread_sleep_secs: default_thread_sleep_secs(),
        }
    }
}

const fn default_users_initial_secs() -> u64 {
    10
}

const fn default_users_max_secs() -> u64 {
    120
}

const fn default_history_wait_secs() -> u64 {
    30
}

const fn default_history_page_delay_ms() -> u64 {
    1000
}

const fn default_thread_sleep_secs() -> f64 {
    0.5
}

impl BackoffConfig {
    /// Pause between history pages.
    #[must_use]
    pub const fn history_page_delay(&self) -> Duration {
        Duration::from_millis(self.history_page_delay_ms)
    }

    /// Pause between thread reply pages. Negative or non-finite values mean no pause.
    #[must_use]
    pub fn thread_sleep(&self) -> Duration {
        Duration::try_from_secs_f64(self.thread_sleep_secs).unwrap_or(Duration::ZERO)
    }
}

/// Export output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Conversation types requested from `conversations.list`.
    #[serde(default = "default_conversation_types")]
    pub conversation_types: String,

    /// Prefix for the timestamped output directory.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Fixed output directory; overrides the timestamped default.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            conversation_types: default_conversation_types(),
            output_prefix: default_output_prefix(),
            output_dir: None,
        }
    }
}

fn default_conversation_types() -> String {
    "public_channel,private_channel,im,mpim".to_string()
}

fn default_output_prefix() -> String {
    "output".to_string()
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub backoff: BackoffConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".slack-history-export")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }
}
