//! Infrastructure layer - external adapters (Slack API, filesystem, console).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod progress_log;
pub mod slack_client;
pub mod transcript_writer;

pub use config::{ensure_config_exists, load_config};
pub use progress_log::ProgressWriter;
pub use slack_client::{HistoryQuery, Page, SlackApi, SlackClient};
pub use transcript_writer::{safe_name, timestamped_dir, TranscriptWriter};
