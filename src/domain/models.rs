//! Domain models for exported Slack data.
//!
//! These are transient: built per run or per conversation and discarded
//! once the transcript file is written.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Subtype that is exported despite carrying a `subtype` field.
pub const THREAD_BROADCAST: &str = "thread_broadcast";

/// A workspace member as returned by `users.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
}

impl User {
    /// Real name, then handle, then the raw id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        non_empty(self.real_name.as_deref())
            .or_else(|| non_empty(self.name.as_deref()))
            .unwrap_or(&self.id)
    }
}

/// A user group as returned by `usergroups.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserGroup {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

impl UserGroup {
    /// Name, then handle, then the raw id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        non_empty(self.name.as_deref())
            .or_else(|| non_empty(self.handle.as_deref()))
            .unwrap_or(&self.id)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// Identifier to display-name lookup. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameMap {
    names: HashMap<String, String>,
}

impl NameMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a display name.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Look up a display name, falling back to the given default.
    #[must_use]
    pub fn get_or<'a>(&'a self, id: &str, fallback: &'a str) -> &'a str {
        self.get(id).unwrap_or(fallback)
    }

    /// Number of known identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no identifiers are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
impl NameMap {
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }
}

impl FromIterator<(String, String)> for NameMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl From<&[User]> for NameMap {
    fn from(users: &[User]) -> Self {
        users
            .iter()
            .map(|u| (u.id.clone(), u.display_name().to_string()))
            .collect()
    }
}

impl From<&[UserGroup]> for NameMap {
    fn from(groups: &[UserGroup]) -> Self {
        groups
            .iter()
            .map(|g| (g.id.clone(), g.display_name().to_string()))
            .collect()
    }
}

/// Conversation descriptor from `conversations.list`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Direct-message flag.
    #[serde(default)]
    pub is_im: bool,
    /// Counterpart user for direct messages.
    #[serde(default)]
    pub user: Option<String>,
}

#[cfg(test)]
impl ConversationInfo {
    pub fn channel(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            is_im: false,
            user: None,
        }
    }

    pub fn direct_message(id: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            is_im: true,
            user: Some(user.into()),
        }
    }
}

/// A single message from `conversations.history` or `conversations.replies`.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Decimal seconds since the epoch, e.g. `1700000000.000100`.
    pub ts: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

/// Slack occasionally sends `"text": null`; treat it like a missing field.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    /// Timestamp as floating-point seconds. Unparsable values sort first.
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.ts.parse().unwrap_or_else(|_| {
            tracing::debug!(ts = %self.ts, "Unparsable message timestamp");
            0.0
        })
    }

    /// Whether this message starts a thread.
    #[must_use]
    pub fn is_thread_parent(&self) -> bool {
        self.thread_ts.as_deref() == Some(self.ts.as_str())
    }

    /// Whether this message belongs in a transcript.
    ///
    /// Subtyped messages (joins, topic changes, bot notices) are dropped,
    /// except broadcasts of thread replies.
    #[must_use]
    pub fn is_exportable(&self) -> bool {
        self.subtype
            .as_deref()
            .is_none_or(|subtype| subtype == THREAD_BROADCAST)
    }
}

#[cfg(test)]
impl Message {
    pub fn new(ts: impl Into<String>, user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            user: Some(user.into()),
            text: text.into(),
            thread_ts: None,
            subtype: None,
        }
    }

    pub fn in_thread(mut self, thread_ts: impl Into<String>) -> Self {
        self.thread_ts = Some(thread_ts.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }
}

/// Sort messages ascending by timestamp.
pub fn sort_by_timestamp(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp().total_cmp(&b.timestamp()));
}

/// Everything fetched for one conversation.
#[derive(Debug, Clone, Default)]
pub struct ChannelExport {
    /// Top-level messages inside the requested range.
    pub messages: Vec<Message>,
    /// Replies keyed by parent timestamp.
    pub threads: HashMap<String, Vec<Message>>,
    /// Set when a fetch loop stopped on a non-rate-limit error.
    pub incomplete: bool,
}

impl ChannelExport {
    /// Replies for the thread rooted at `parent_ts`.
    #[must_use]
    pub fn replies(&self, parent_ts: &str) -> &[Message] {
        self.threads.get(parent_ts).map_or(&[], Vec::as_slice)
    }

    /// Total number of thread replies.
    #[must_use]
    pub fn reply_count(&self) -> usize {
        self.threads.values().map(Vec::len).sum()
    }
}

/// Summary statistics for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportStats {
    /// Conversations written.
    pub conversations: usize,
    /// Top-level messages written.
    pub messages: usize,
    /// Thread replies written.
    pub replies: usize,
    /// Files written (resolved and unresolved).
    pub files_written: usize,
    /// Conversations whose fetch stopped on an API error.
    pub incomplete: usize,
}

impl ExportStats {
    /// Fold one conversation into the totals.
    pub fn record(&mut self, export: &ChannelExport, files: usize) {
        self.conversations += 1;
        self.messages += export.messages.len();
        self.replies += export.reply_count();
        self.files_written += files;
        if export.incomplete {
            self.incomplete += 1;
        }
    }
}
