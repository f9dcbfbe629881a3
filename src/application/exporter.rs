//! Export orchestration.
//!
//! Loads the name maps and the conversation listing once, then fetches,
//! renders and writes each selected conversation in turn.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::{AppConfig, ConversationInfo, ExportStats, NameMap, Result};
use crate::infrastructure::{SlackApi, TranscriptWriter};

use super::directory::{fetch_conversations, fetch_group_map, fetch_user_map};
use super::formatter::{render_transcript, RenderContext};
use super::history::{fetch_channel, DateRange};
use super::selection::{file_base_for, label_for};

/// Name maps and conversation listing for one run.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub users: NameMap,
    pub groups: NameMap,
    pub conversations: Vec<ConversationInfo>,
}

/// Drives one export run against a [`SlackApi`].
pub struct ExportService<'a, A> {
    api: &'a A,
    config: &'a AppConfig,
    progress: ProgressBar,
}

impl<'a, A: SlackApi> ExportService<'a, A> {
    /// Create a service over an API client and configuration.
    #[must_use]
    pub fn new(api: &'a A, config: &'a AppConfig) -> Self {
        Self {
            api,
            config,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report export progress on `progress`.
    ///
    /// The caller owns the draw target; share the same bar with the log
    /// writer so log lines are printed above it.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Load user and group names and list conversations.
    ///
    /// # Errors
    /// Returns error if the conversation listing fails.
    pub async fn load_workspace(&self) -> Result<Workspace> {
        let users = fetch_user_map(self.api, &self.config.backoff).await;
        let groups = fetch_group_map(self.api).await;
        if users.is_empty() {
            tracing::warn!("⚠️ No user names loaded; authors will show as unknown");
        }
        let conversations = fetch_conversations(
            self.api,
            &self.config.export.conversation_types,
            &self.config.backoff,
        )
        .await?;

        Ok(Workspace {
            users,
            groups,
            conversations,
        })
    }

    /// Fetch and write every conversation in `selected`.
    ///
    /// API errors end the affected fetch loop only; whatever was gathered is
    /// still written and the conversation is counted as incomplete.
    ///
    /// # Errors
    /// Returns error if a transcript file cannot be written.
    pub async fn export(
        &self,
        workspace: &Workspace,
        selected: &[ConversationInfo],
        range: DateRange,
        writer: &TranscriptWriter,
    ) -> Result<ExportStats> {
        let mut stats = ExportStats::default();
        let progress = &self.progress;
        progress.set_length(selected.len() as u64);
        progress.set_position(0);
        if let Ok(style) =
            ProgressStyle::with_template("📥 Exporting {bar:30.cyan/blue} {pos}/{len} {msg}")
        {
            progress.set_style(style);
        }

        for conv in selected {
            let label = label_for(conv, &workspace.users);
            progress.set_message(label.clone());
            progress.suspend(|| println!("\n📁 Exporting: {}", label.cyan()));

            let export = fetch_channel(self.api, &conv.id, range, &self.config.backoff).await;
            let base = file_base_for(conv, &workspace.users);

            let resolved = RenderContext {
                users: &workspace.users,
                groups: &workspace.groups,
                resolve_mentions: true,
            };
            writer.write_resolved(&base, &render_transcript(&export, &resolved))?;
            let mut files = 1;

            if writer.unresolved_dir().is_some() {
                let raw = RenderContext {
                    resolve_mentions: false,
                    ..resolved
                };
                writer.write_unresolved(&base, &render_transcript(&export, &raw))?;
                files += 1;
            }

            if export.incomplete {
                tracing::warn!(conversation = %label, "Export incomplete due to API errors");
            }

            stats.record(&export, files);
            progress.inc(1);
        }

        progress.finish_and_clear();
        Ok(stats)
    }
}
