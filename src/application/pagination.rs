//! Cursor pagination with rate-limit retry.
//!
//! One loop serves every listing endpoint: fetch a page, follow
//! `next_cursor` until it is absent, sleep and retry the same page when
//! throttled, and stop at the first other error.

use std::future::Future;
use std::time::Duration;

use crate::domain::{AppError, BackoffConfig, Result};
use crate::infrastructure::Page;

/// How a pagination loop waits when throttled and between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait used when the server sends no `Retry-After`.
    pub default_wait: Duration,
    /// Upper bound for an escalating default.
    pub max_wait: Duration,
    /// Double the default after each throttled attempt, reset after a good page.
    pub escalate: bool,
    /// Pause after each page that has a successor.
    pub page_delay: Duration,
}

impl RetryPolicy {
    /// Constant default wait.
    #[must_use]
    pub const fn fixed(default_wait: Duration) -> Self {
        Self {
            default_wait,
            max_wait: default_wait,
            escalate: false,
            page_delay: Duration::ZERO,
        }
    }

    /// Default wait doubling from `initial` up to `max`.
    #[must_use]
    pub const fn escalating(initial: Duration, max: Duration) -> Self {
        Self {
            default_wait: initial,
            max_wait: max,
            escalate: true,
            page_delay: Duration::ZERO,
        }
    }

    /// Set the pause between pages.
    #[must_use]
    pub const fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Policy for `users.list`.
    #[must_use]
    pub const fn users(backoff: &BackoffConfig) -> Self {
        Self::escalating(
            Duration::from_secs(backoff.users_initial_secs),
            Duration::from_secs(backoff.users_max_secs),
        )
    }

    /// Policy for `conversations.history`.
    #[must_use]
    pub const fn history(backoff: &BackoffConfig) -> Self {
        Self::fixed(Duration::from_secs(backoff.history_wait_secs))
            .with_page_delay(backoff.history_page_delay())
    }

    /// Policy for `conversations.replies`.
    #[must_use]
    pub fn replies(backoff: &BackoffConfig) -> Self {
        Self::fixed(Duration::from_secs(backoff.history_wait_secs))
            .with_page_delay(backoff.thread_sleep())
    }

    fn next_wait(&self, current: Duration) -> Duration {
        if self.escalate {
            (current * 2).min(self.max_wait)
        } else {
            current
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(30))
    }
}

/// Items gathered by a pagination loop, plus the error that ended it early.
#[derive(Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Pages fetched successfully.
    pub pages: usize,
    /// Times the loop was throttled and slept.
    pub rate_limited: usize,
    /// Set when a non-rate-limit error stopped the loop.
    pub error: Option<AppError>,
}

impl<T> Paginated<T> {
    /// Whether the loop ran until the last page.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Treat an early stop as fatal.
    ///
    /// # Errors
    /// Returns the error that ended the loop.
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.items),
        }
    }
}

/// Run a cursor pagination loop.
///
/// `fetch` receives the cursor for the page to load (`None` for the first
/// page). The loop ends when a page carries no next cursor, or on the first
/// error that is not a rate limit; in the latter case the items gathered so
/// far are returned alongside the error.
pub async fn paginate<T, F, Fut>(label: &str, policy: RetryPolicy, mut fetch: F) -> Paginated<T>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut result = Paginated {
        items: Vec::new(),
        pages: 0,
        rate_limited: 0,
        error: None,
    };
    let mut cursor: Option<String> = None;
    let mut wait = policy.default_wait;

    loop {
        match fetch(cursor.clone()).await {
            Ok(page) => {
                result.pages += 1;
                result.items.extend(page.items);
                wait = policy.default_wait;

                tracing::debug!(
                    label,
                    page = result.pages,
                    total = result.items.len(),
                    "Fetched page"
                );

                match page.next_cursor {
                    Some(next) => {
                        cursor = Some(next);
                        if !policy.page_delay.is_zero() {
                            tokio::time::sleep(policy.page_delay).await;
                        }
                    }
                    None => break,
                }
            }
            Err(e) if e.is_rate_limited() => {
                let sleep_for = e.retry_after().map_or(wait, Duration::from_secs);
                result.rate_limited += 1;
                tracing::warn!("⏳ {label} rate-limited, sleeping {}s …", sleep_for.as_secs_f64());
                tokio::time::sleep(sleep_for).await;
                wait = policy.next_wait(wait);
            }
            Err(e) => {
                tracing::warn!("⚠️ {label} failed: {e}");
                result.error = Some(e);
                break;
            }
        }
    }

    tracing::debug!(
        label,
        pages = result.pages,
        rate_limited = result.rate_limited,
        complete = result.is_complete(),
        "Pagination finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    fn throttled(retry_after: Option<u64>) -> Result<Page<u32>> {
        Err(AppError::RateLimited {
            method: "test.list".into(),
            retry_after,
        })
    }

    /// Runs `paginate` over a fixed script, recording the cursors requested.
    async fn run_script(
        policy: RetryPolicy,
        script: Vec<Result<Page<u32>>>,
    ) -> (Paginated<u32>, Vec<Option<String>>) {
        let mut script: VecDeque<_> = script.into();
        let mut seen = Vec::new();
        let result = paginate("test.list", policy, |cursor| {
            seen.push(cursor);
            let next = script.pop_front().expect("script exhausted");
            async move { next }
        })
        .await;
        (result, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_cursors_until_absent() {
        let (result, seen) = run_script(
            RetryPolicy::default(),
            vec![
                Ok(Page::more(vec![1, 2], "c1")),
                Ok(Page::more(vec![3], "c2")),
                Ok(Page::last(vec![4, 5])),
            ],
        )
        .await;

        assert!(result.is_complete());
        assert_eq!(result.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.pages, 3);
        assert_eq!(
            seen,
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_same_page_with_server_wait() {
        let start = Instant::now();
        let (result, seen) = run_script(
            RetryPolicy::fixed(Duration::from_secs(30)),
            vec![
                Ok(Page::more(vec![1], "c1")),
                throttled(Some(7)),
                Ok(Page::last(vec![2])),
            ],
        )
        .await;

        assert_eq!(result.items, vec![1, 2]);
        assert_eq!(result.rate_limited, 1);
        assert_eq!(seen[1], seen[2]);
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_default_wait_without_retry_after() {
        let start = Instant::now();
        let (result, _) = run_script(
            RetryPolicy::fixed(Duration::from_secs(30)),
            vec![throttled(None), throttled(None), Ok(Page::last(vec![1]))],
        )
        .await;

        assert_eq!(result.items, vec![1]);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalating_wait_is_capped_and_resets() {
        let start = Instant::now();
        let policy = RetryPolicy::escalating(Duration::from_secs(10), Duration::from_secs(25));
        let (result, _) = run_script(
            policy,
            vec![
                throttled(None), // 10
                throttled(None), // 20
                throttled(None), // 25 (capped)
                Ok(Page::more(vec![1], "c1")),
                throttled(None), // 10 again after a good page
                Ok(Page::last(vec![2])),
            ],
        )
        .await;

        assert_eq!(result.items, vec![1, 2]);
        assert_eq!(result.rate_limited, 4);
        assert_eq!(start.elapsed(), Duration::from_secs(65));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_error_stops_and_keeps_partial_items() {
        let (result, seen) = run_script(
            RetryPolicy::default(),
            vec![
                Ok(Page::more(vec![1, 2], "c1")),
                Err(AppError::Api {
                    method: "test.list".into(),
                    error: "channel_not_found".into(),
                }),
            ],
        )
        .await;

        assert!(!result.is_complete());
        assert_eq!(seen.len(), 2);
        assert_eq!(result.items, vec![1, 2]);
        assert!(matches!(result.into_result(), Err(AppError::Api { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_only_between_pages() {
        let start = Instant::now();
        let policy = RetryPolicy::default().with_page_delay(Duration::from_secs(1));
        let (result, _) = run_script(
            policy,
            vec![
                Ok(Page::more(vec![1], "c1")),
                Ok(Page::more(vec![2], "c2")),
                Ok(Page::last(vec![3])),
            ],
        )
        .await;

        assert_eq!(result.pages, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_policies_from_config() {
        let backoff = BackoffConfig::default();

        let users = RetryPolicy::users(&backoff);
        assert!(users.escalate);
        assert_eq!(users.default_wait, Duration::from_secs(10));
        assert_eq!(users.max_wait, Duration::from_secs(120));

        let history = RetryPolicy::history(&backoff);
        assert!(!history.escalate);
        assert_eq!(history.page_delay, Duration::from_secs(1));

        let replies = RetryPolicy::replies(&backoff);
        assert_eq!(replies.page_delay, Duration::from_millis(500));
    }
}
