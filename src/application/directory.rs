//! Workspace directory lookups: user names, group names, conversations.

use crate::domain::{BackoffConfig, ConversationInfo, NameMap, Result};
use crate::infrastructure::SlackApi;

use super::pagination::{paginate, RetryPolicy};

/// Build the user id → display name map.
///
/// A failure other than rate limiting keeps whatever was collected.
pub async fn fetch_user_map<A: SlackApi>(api: &A, backoff: &BackoffConfig) -> NameMap {
    let result = paginate("users.list", RetryPolicy::users(backoff), |cursor| async move {
        api.users_list(cursor.as_deref()).await
    })
    .await;

    let map = NameMap::from(result.items.as_slice());
    tracing::info!(users = map.len(), pages = result.pages, "Loaded user map");
    map
}

/// Build the user group id → name map. Any failure yields an empty map.
pub async fn fetch_group_map<A: SlackApi>(api: &A) -> NameMap {
    match api.usergroups_list().await {
        Ok(groups) => {
            let map = NameMap::from(groups.as_slice());
            tracing::info!(groups = map.len(), "Loaded group map");
            map
        }
        Err(e) => {
            tracing::debug!("usergroups.list unavailable: {e}");
            NameMap::new()
        }
    }
}

/// List every conversation of the requested types.
///
/// # Errors
/// Returns the API error if the listing cannot be completed.
pub async fn fetch_conversations<A: SlackApi>(
    api: &A,
    types: &str,
    backoff: &BackoffConfig,
) -> Result<Vec<ConversationInfo>> {
    let policy = RetryPolicy::fixed(std::time::Duration::from_secs(backoff.history_wait_secs));
    let conversations = paginate("conversations.list", policy, |cursor| async move {
        api.conversations_list(types, cursor.as_deref()).await
    })
    .await
    .into_result()?;

    tracing::info!(conversations = conversations.len(), "Listed conversations");
    Ok(conversations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{api_error, group, rate_limited, user, FakeSlack};
    use crate::infrastructure::Page;

    #[tokio::test(start_paused = true)]
    async fn test_user_map_spans_pages_and_retries() {
        let api = FakeSlack::new();
        api.push_users(Ok(Page::more(vec![user("U1", "Ann")], "c1")))
            .push_users(Err(rate_limited("users.list", Some(1))))
            .push_users(Ok(Page::last(vec![user("U2", "Bo")])));

        let map = fetch_user_map(&api, &BackoffConfig::default()).await;

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("U1"), Some("Ann"));
        assert_eq!(map.get("U2"), Some("Bo"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_map_keeps_partial_on_error() {
        let api = FakeSlack::new();
        api.push_users(Ok(Page::more(vec![user("U1", "Ann")], "c1")))
            .push_users(Err(api_error("users.list", "invalid_cursor")));

        let map = fetch_user_map(&api, &BackoffConfig::default()).await;

        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn test_group_map_empty_on_error() {
        let api = FakeSlack::new();
        api.set_groups(Err(api_error("usergroups.list", "missing_scope")));

        assert!(fetch_group_map(&api).await.is_empty());
    }

    #[tokio::test]
    async fn test_group_map() {
        let api = FakeSlack::new();
        api.set_groups(Ok(vec![group("S1", "oncall")]));

        assert_eq!(fetch_group_map(&api).await.get("S1"), Some("oncall"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_conversation_listing_error_is_fatal() {
        let api = FakeSlack::new();
        api.push_conversations(Ok(Page::more(
            vec![ConversationInfo::channel("C1", "general")],
            "c1",
        )))
        .push_conversations(Err(api_error("conversations.list", "invalid_auth")));

        let result = fetch_conversations(&api, "public_channel", &BackoffConfig::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_conversation_listing() {
        let api = FakeSlack::new();
        api.push_conversations(Ok(Page::more(
            vec![ConversationInfo::channel("C1", "general")],
            "c1",
        )))
        .push_conversations(Ok(Page::last(vec![ConversationInfo::direct_message(
            "D1", "U1",
        )])));

        let conversations = fetch_conversations(&api, "public_channel,im", &BackoffConfig::default())
            .await
            .unwrap();
        assert_eq!(conversations.len(), 2);
        assert!(conversations[1].is_im);
    }
}
