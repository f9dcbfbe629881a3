//! Conversation labels and selection.

use crate::domain::{ConversationInfo, NameMap};
use crate::infrastructure::safe_name;

/// Which conversations to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    /// Every listed conversation.
    All,
    /// Channels and groups, no direct messages.
    Channels,
    /// Direct messages only.
    DirectMessages,
    /// Comma-separated indexes or labels.
    Named(String),
}

/// Human label: `DM with <name>` for direct messages, otherwise the channel name.
#[must_use]
pub fn label_for(conv: &ConversationInfo, users: &NameMap) -> String {
    if conv.is_im {
        let name = conv
            .user
            .as_deref()
            .and_then(|id| users.get(id))
            .unwrap_or(&conv.id);
        format!("DM with {name}")
    } else {
        conv.name
            .clone()
            .unwrap_or_else(|| format!("channel_{}", conv.id))
    }
}

/// Base name (without extension) of the transcript file.
#[must_use]
pub fn file_base_for(conv: &ConversationInfo, users: &NameMap) -> String {
    if conv.is_im {
        let name = conv
            .user
            .as_deref()
            .and_then(|id| users.get(id))
            .unwrap_or(&conv.id);
        format!("dm-{}", safe_name(name))
    } else {
        safe_name(conv.name.as_deref().unwrap_or(&conv.id))
    }
}

/// Pick conversations by comma-separated indexes or labels (case-insensitive).
///
/// When several conversations share a label the last one listed wins.
/// Unmatched tokens are logged and skipped.
#[must_use]
pub fn resolve_selection(
    conversations: &[ConversationInfo],
    selection: &str,
    users: &NameMap,
) -> Vec<ConversationInfo> {
    let labels: Vec<String> = conversations
        .iter()
        .map(|c| label_for(c, users).to_lowercase())
        .collect();

    let mut selected = Vec::new();
    for token in selection.split(',') {
        let key = token.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }

        let by_index = key
            .parse::<usize>()
            .ok()
            .and_then(|i| conversations.get(i));
        let found = by_index.or_else(|| {
            labels
                .iter()
                .rposition(|l| *l == key)
                .map(|i| &conversations[i])
        });

        match found {
            Some(conv) => selected.push(conv.clone()),
            None => tracing::warn!("⚠️ Not found: {}", token.trim()),
        }
    }
    selected
}

/// Apply an export scope to the full listing.
#[must_use]
pub fn select(
    conversations: &[ConversationInfo],
    scope: &ExportScope,
    users: &NameMap,
) -> Vec<ConversationInfo> {
    match scope {
        ExportScope::All => conversations.to_vec(),
        ExportScope::Channels => conversations.iter().filter(|c| !c.is_im).cloned().collect(),
        ExportScope::DirectMessages => conversations.iter().filter(|c| c.is_im).cloned().collect(),
        ExportScope::Named(selection) => resolve_selection(conversations, selection, users),
    }
}
