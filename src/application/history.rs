//! Message history and thread replies for a single conversation.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};

use crate::domain::{AppError, BackoffConfig, ChannelExport, Message, Result};
use crate::infrastructure::{HistoryQuery, SlackApi};

use super::pagination::{paginate, RetryPolicy};

/// Inclusive time window in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub oldest: i64,
    pub latest: i64,
}

/// Format of `--start` / `--end`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Start date used when none is given.
pub const DEFAULT_START: &str = "2000-01-01";

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns `Config` error if the date is malformed.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| AppError::Config {
        message: format!("Invalid date '{value}' (expected YYYY-MM-DD): {e}"),
    })
}

/// Default end date: tomorrow, so today's messages are always included.
#[must_use]
pub fn default_end() -> NaiveDate {
    let today = Local::now().date_naive();
    today.succ_opt().unwrap_or(today)
}

fn local_midnight(date: NaiveDate) -> Result<i64> {
    Local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| AppError::Config {
            message: format!("Date {date} has no local midnight"),
        })
}

impl DateRange {
    /// Window from local midnight of `start` to the last second of `end`.
    ///
    /// # Errors
    /// Returns `Config` error if `end` precedes `start`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(AppError::Config {
                message: format!("End date {end} is before start date {start}"),
            });
        }
        Ok(Self {
            oldest: local_midnight(start)?,
            latest: local_midnight(end)? + 86_399,
        })
    }

    /// Whether a message timestamp falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: f64) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let (oldest, latest) = (self.oldest as f64, self.latest as f64);
        (oldest..=latest).contains(&ts)
    }
}

/// Fetch top-level messages in `range`, then the replies of every thread
/// started inside it.
pub async fn fetch_channel<A: SlackApi>(
    api: &A,
    channel_id: &str,
    range: DateRange,
    backoff: &BackoffConfig,
) -> ChannelExport {
    let query = HistoryQuery {
        channel: channel_id,
        oldest: range.oldest,
        latest: range.latest,
    };

    let history = paginate(
        "conversations.history",
        RetryPolicy::history(backoff),
        |cursor| async move { api.conversations_history(query, cursor.as_deref()).await },
    )
    .await;

    let mut export = ChannelExport {
        incomplete: !history.is_complete(),
        ..ChannelExport::default()
    };
    let mut parents = Vec::new();

    for message in history.items {
        if !message.is_exportable() || !range.contains(message.timestamp()) {
            continue;
        }
        if message.is_thread_parent() {
            parents.push(message.ts.clone());
        }
        export.messages.push(message);
    }

    let total = parents.len();
    for (index, parent_ts) in parents.into_iter().enumerate() {
        let label = format!("thread {}/{total}", index + 1);
        let (replies, complete) = fetch_thread(api, channel_id, &parent_ts, &label, backoff).await;
        export.incomplete |= !complete;
        export.threads.insert(parent_ts, replies);
    }

    tracing::info!(
        channel = channel_id,
        messages = export.messages.len(),
        threads = total,
        replies = export.reply_count(),
        "Fetched conversation"
    );

    export
}

/// Fetch all replies of one thread, excluding the parent message itself.
///
/// Returns the replies and whether every page was fetched.
pub async fn fetch_thread<A: SlackApi>(
    api: &A,
    channel_id: &str,
    parent_ts: &str,
    label: &str,
    backoff: &BackoffConfig,
) -> (Vec<Message>, bool) {
    tracing::debug!("🔄 Fetching thread replies for parent_ts={parent_ts}");

    let result = paginate(label, RetryPolicy::replies(backoff), |cursor| async move {
        api.conversations_replies(channel_id, parent_ts, cursor.as_deref())
            .await
    })
    .await;

    let complete = result.is_complete();
    let replies = result
        .items
        .into_iter()
        .filter(|m| m.ts != parent_ts)
        .collect();
    (replies, complete)
}
