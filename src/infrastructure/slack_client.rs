//! Slack Web API client.
//!
//! Thin reqwest wrapper around the five read endpoints the exporter needs.
//! Every call is a single page; looping and retrying live in
//! `application::pagination`.

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{ApiConfig, AppError, ConversationInfo, Message, Result, User, UserGroup};

/// Error code Slack puts in the envelope when throttling.
const RATE_LIMITED: &str = "ratelimited";

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` when this was the last one.
    pub next_cursor: Option<String>,
}

#[cfg(test)]
impl<T> Page<T> {
    pub const fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    pub fn more(items: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            items,
            next_cursor: Some(cursor.into()),
        }
    }
}

/// Bounds and target of a `conversations.history` request.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery<'a> {
    pub channel: &'a str,
    /// Inclusive lower bound, seconds since the epoch.
    pub oldest: i64,
    /// Inclusive upper bound, seconds since the epoch.
    pub latest: i64,
}

/// Read access to the Slack Web API.
///
/// Implemented by [`SlackClient`] and by scripted fakes in tests.
pub trait SlackApi {
    /// One page of `users.list`.
    async fn users_list(&self, cursor: Option<&str>) -> Result<Page<User>>;

    /// All of `usergroups.list` (not paginated).
    async fn usergroups_list(&self) -> Result<Vec<UserGroup>>;

    /// One page of `conversations.list`.
    async fn conversations_list(
        &self,
        types: &str,
        cursor: Option<&str>,
    ) -> Result<Page<ConversationInfo>>;

    /// One page of `conversations.history`.
    async fn conversations_history(
        &self,
        query: HistoryQuery<'_>,
        cursor: Option<&str>,
    ) -> Result<Page<Message>>;

    /// One page of `conversations.replies` for the thread rooted at `ts`.
    async fn conversations_replies(
        &self,
        channel: &str,
        ts: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>>;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

fn next_cursor(meta: Option<ResponseMetadata>) -> Option<String> {
    meta.map(|m| m.next_cursor).filter(|c| !c.is_empty())
}

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    #[serde(default)]
    members: Vec<User>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct UserGroupsResponse {
    #[serde(default)]
    usergroups: Vec<UserGroup>,
}

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    #[serde(default)]
    channels: Vec<ConversationInfo>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

/// Slack Web API client authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    token: String,
    base_url: String,
    page_limit: u32,
    replies_limit: u32,
}

impl SlackClient {
    /// Create a client from a token and API settings.
    ///
    /// # Errors
    /// Returns error if the token is blank or the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: &ApiConfig) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AppError::Config {
                message: "SLACK_TOKEN is empty".into(),
            });
        }

        let http = Client::builder()
            .user_agent(format!("slack-history-export/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AppError::http)?;

        Ok(Self {
            http,
            token,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_limit: config.page_limit,
            replies_limit: config.replies_limit,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, String)]) -> Result<T> {
        tracing::trace!(method, ?params, "Calling Slack API");

        let response = self
            .http
            .get(format!("{}/{method}", self.base_url))
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .map_err(AppError::http)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await.map_err(AppError::http)?;

        decode_response(method, status, retry_after.as_deref(), &body)
    }
}

fn with_cursor(mut params: Vec<(&'static str, String)>, cursor: Option<&str>) -> Vec<(&'static str, String)> {
    if let Some(cursor) = cursor {
        params.push(("cursor", cursor.to_string()));
    }
    params
}

impl SlackApi for SlackClient {
    async fn users_list(&self, cursor: Option<&str>) -> Result<Page<User>> {
        let params = with_cursor(vec![("limit", self.page_limit.to_string())], cursor);
        let r: UsersListResponse = self.call("users.list", &params).await?;
        Ok(Page {
            items: r.members,
            next_cursor: next_cursor(r.response_metadata),
        })
    }

    async fn usergroups_list(&self) -> Result<Vec<UserGroup>> {
        let r: UserGroupsResponse = self.call("usergroups.list", &[]).await?;
        Ok(r.usergroups)
    }

    async fn conversations_list(
        &self,
        types: &str,
        cursor: Option<&str>,
    ) -> Result<Page<ConversationInfo>> {
        let params = with_cursor(
            vec![
                ("types", types.to_string()),
                ("limit", self.page_limit.to_string()),
            ],
            cursor,
        );
        let r: ConversationsListResponse = self.call("conversations.list", &params).await?;
        Ok(Page {
            items: r.channels,
            next_cursor: next_cursor(r.response_metadata),
        })
    }

    async fn conversations_history(
        &self,
        query: HistoryQuery<'_>,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        let params = with_cursor(
            vec![
                ("channel", query.channel.to_string()),
                ("limit", self.page_limit.to_string()),
                ("oldest", query.oldest.to_string()),
                ("latest", query.latest.to_string()),
                ("inclusive", "true".to_string()),
            ],
            cursor,
        );
        let r: MessagesResponse = self.call("conversations.history", &params).await?;
        Ok(Page {
            items: r.messages,
            next_cursor: next_cursor(r.response_metadata),
        })
    }

    async fn conversations_replies(
        &self,
        channel: &str,
        ts: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        let params = with_cursor(
            vec![
                ("channel", channel.to_string()),
                ("ts", ts.to_string()),
                ("limit", self.replies_limit.to_string()),
            ],
            cursor,
        );
        let r: MessagesResponse = self.call("conversations.replies", &params).await?;
        Ok(Page {
            items: r.messages,
            next_cursor: next_cursor(r.response_metadata),
        })
    }
}

/// Turn a raw HTTP response into a typed body or a classified error.
///
/// 429 and `{"ok": false, "error": "ratelimited"}` both become
/// [`AppError::RateLimited`] so the caller can back off.
fn decode_response<T: DeserializeOwned>(
    method: &str,
    status: StatusCode,
    retry_after: Option<&str>,
    body: &str,
) -> Result<T> {
    let retry_after = retry_after.and_then(|v| v.trim().parse::<u64>().ok());

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AppError::RateLimited {
            method: method.to_string(),
            retry_after,
        });
    }

    if !status.is_success() {
        return Err(AppError::HttpStatus {
            method: method.to_string(),
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(AppError::json_parse)?;
    let envelope: Envelope = serde_json::from_value(value.clone()).map_err(AppError::json_parse)?;

    if !envelope.ok {
        let error = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
        if error == RATE_LIMITED {
            return Err(AppError::RateLimited {
                method: method.to_string(),
                retry_after,
            });
        }
        return Err(AppError::Api {
            method: method.to_string(),
            error,
        });
    }

    serde_json::from_value(value).map_err(AppError::json_parse)
}
