//! CLI interface using clap.
//!
//! Provides command-line arguments for selecting conversations, the date
//! range and output options.

use std::path::PathBuf;

use clap::Parser;

use crate::application::ExportScope;

/// Slack History Export - write Slack conversations to flat text transcripts.
///
/// Reads the API token from `SLACK_TOKEN`. Without a selection flag the
/// available conversations are listed and you are prompted for a choice.
#[derive(Parser, Debug)]
#[command(name = "slack-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Slack API token (bot or user token).
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Conversations to export: comma-separated indexes or names.
    #[arg(long)]
    pub channels: Option<String>,

    /// Start date (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub end: Option<String>,

    /// Seconds to wait between thread reply pages.
    #[arg(long)]
    pub thread_sleep: Option<f64>,

    /// Export all channels and DMs.
    #[arg(long)]
    pub all: bool,

    /// Export all public/private channels.
    #[arg(long)]
    pub all_channels: bool,

    /// Export all direct messages.
    #[arg(long)]
    pub all_dms: bool,

    /// Also write copies with raw, unresolved mention tokens.
    #[arg(long)]
    pub save_unresolved: bool,

    /// Output directory (default: output-YYYY-MM-DD-HH-MM).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Configuration file (default: ~/.slack-history-export/config.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a default configuration file and exit.
    #[arg(long)]
    pub init_config: bool,

    /// List conversations and exit.
    #[arg(long)]
    pub list: bool,

    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Export scope chosen by flags, or `None` to prompt.
    #[must_use]
    pub fn scope(&self) -> Option<ExportScope> {
        if self.all {
            Some(ExportScope::All)
        } else if self.all_channels {
            Some(ExportScope::Channels)
        } else if self.all_dms {
            Some(ExportScope::DirectMessages)
        } else {
            self.channels.clone().map(ExportScope::Named)
        }
    }
}
