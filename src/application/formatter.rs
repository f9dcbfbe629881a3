//! Transcript rendering and console output.

use chrono::{DateTime, Local};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{sort_by_timestamp, ChannelExport, ConversationInfo, ExportStats, Message, NameMap};

use super::resolver::resolve_text;
use super::selection::label_for;

/// Author shown when a message has no known user.
const UNKNOWN_AUTHOR: &str = "unknown";

/// Prefix for thread reply lines.
const REPLY_PREFIX: &str = "    ↳ ";

/// Render an epoch-seconds timestamp string as local `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_ts(ts: &str) -> String {
    let seconds = ts.parse::<f64>().unwrap_or(0.0);
    #[allow(clippy::cast_possible_truncation)]
    let whole = seconds.floor() as i64;
    DateTime::from_timestamp(whole, 0).map_or_else(
        || ts.to_string(),
        |dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Name maps used while rendering. `resolve_mentions` controls whether
/// mention tokens in message text are replaced.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub users: &'a NameMap,
    pub groups: &'a NameMap,
    pub resolve_mentions: bool,
}

impl RenderContext<'_> {
    fn author<'m>(&'m self, message: &'m Message) -> &'m str {
        message
            .user
            .as_deref()
            .and_then(|id| self.users.get(id))
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    fn text(&self, message: &Message) -> String {
        if self.resolve_mentions {
            resolve_text(&message.text, self.users, self.groups)
        } else {
            message.text.clone()
        }
    }

    fn line(&self, message: &Message) -> String {
        format!(
            "[{}] <{}> {}",
            format_ts(&message.ts),
            self.author(message),
            self.text(message)
        )
    }
}

/// Render a conversation as a transcript.
///
/// Top-level messages appear in timestamp order; each thread parent is
/// followed by its replies, also in timestamp order and indented.
#[must_use]
pub fn render_transcript(export: &ChannelExport, ctx: &RenderContext<'_>) -> String {
    let mut messages = export.messages.clone();
    sort_by_timestamp(&mut messages);

    let mut out = String::new();
    for message in &messages {
        out.push_str(&ctx.line(message));
        out.push_str("\n\n");

        if message.is_thread_parent() {
            let mut replies = export.replies(&message.ts).to_vec();
            sort_by_timestamp(&mut replies);
            for reply in &replies {
                out.push_str(REPLY_PREFIX);
                out.push_str(&ctx.line(reply));
                out.push_str("\n\n");
            }
        }
    }
    out
}

/// Formats a numbered table of conversations for selection.
#[must_use]
pub fn format_conversations_table(conversations: &[ConversationInfo], users: &NameMap) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Kind", "Conversation", "ID"]);

    for (i, conv) in conversations.iter().enumerate() {
        let kind = if conv.is_im { "dm" } else { "channel" };
        table.add_row(vec![
            i.to_string(),
            kind.to_string(),
            label_for(conv, users),
            conv.id.clone(),
        ]);
    }

    table.to_string()
}

/// Formats export statistics for display.
#[must_use]
pub fn format_stats(stats: &ExportStats) -> String {
    let mut out = format!(
        "{}\n  Conversations: {}\n  Messages: {}\n  Thread replies: {}\n  Files written: {}",
        "📊 Statistics".bold(),
        stats.conversations.to_string().cyan(),
        stats.messages.to_string().cyan(),
        stats.replies.to_string().green(),
        stats.files_written.to_string().yellow()
    );
    if stats.incomplete > 0 {
        out.push_str(&format!(
            "\n  Incomplete (API errors): {}",
            stats.incomplete.to_string().red()
        ));
    }
    out
}
