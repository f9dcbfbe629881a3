//! Scripted in-memory `SlackApi` for tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::domain::{AppError, ConversationInfo, Message, Result, User, UserGroup};
use crate::infrastructure::{HistoryQuery, Page, SlackApi};

type Script<T> = RefCell<VecDeque<Result<Page<T>>>>;

/// Plays back queued responses per endpoint and records what was asked.
///
/// An exhausted queue answers with an empty last page.
#[derive(Default)]
pub struct FakeSlack {
    pub users: Script<User>,
    pub groups: RefCell<Option<Result<Vec<UserGroup>>>>,
    pub conversations: Script<ConversationInfo>,
    pub history: RefCell<HashMap<String, VecDeque<Result<Page<Message>>>>>,
    pub replies: RefCell<HashMap<String, VecDeque<Result<Page<Message>>>>>,
    pub history_calls: RefCell<Vec<(String, i64, i64, Option<String>)>>,
    pub replies_calls: RefCell<Vec<(String, String, Option<String>)>>,
}

impl FakeSlack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_users(&self, page: Result<Page<User>>) -> &Self {
        self.users.borrow_mut().push_back(page);
        self
    }

    pub fn set_groups(&self, groups: Result<Vec<UserGroup>>) -> &Self {
        *self.groups.borrow_mut() = Some(groups);
        self
    }

    pub fn push_conversations(&self, page: Result<Page<ConversationInfo>>) -> &Self {
        self.conversations.borrow_mut().push_back(page);
        self
    }

    pub fn push_history(&self, channel: &str, page: Result<Page<Message>>) -> &Self {
        self.history
            .borrow_mut()
            .entry(channel.to_string())
            .or_default()
            .push_back(page);
        self
    }

    pub fn push_replies(&self, parent_ts: &str, page: Result<Page<Message>>) -> &Self {
        self.replies
            .borrow_mut()
            .entry(parent_ts.to_string())
            .or_default()
            .push_back(page);
        self
    }
}

fn empty<T>() -> Result<Page<T>> {
    Ok(Page::last(Vec::new()))
}

pub fn user(id: &str, real_name: &str) -> User {
    User {
        id: id.to_string(),
        name: None,
        real_name: Some(real_name.to_string()),
    }
}

pub fn group(id: &str, name: &str) -> UserGroup {
    UserGroup {
        id: id.to_string(),
        name: Some(name.to_string()),
        handle: None,
    }
}

pub fn api_error(method: &str, error: &str) -> AppError {
    AppError::Api {
        method: method.to_string(),
        error: error.to_string(),
    }
}

pub fn rate_limited(method: &str, retry_after: Option<u64>) -> AppError {
    AppError::RateLimited {
        method: method.to_string(),
        retry_after,
    }
}

impl SlackApi for FakeSlack {
    async fn users_list(&self, _cursor: Option<&str>) -> Result<Page<User>> {
        self.users.borrow_mut().pop_front().unwrap_or_else(empty)
    }

    async fn usergroups_list(&self) -> Result<Vec<UserGroup>> {
        self.groups.borrow_mut().take().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn conversations_list(
        &self,
        _types: &str,
        _cursor: Option<&str>,
    ) -> Result<Page<ConversationInfo>> {
        self.conversations
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(empty)
    }

    async fn conversations_history(
        &self,
        query: HistoryQuery<'_>,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        self.history_calls.borrow_mut().push((
            query.channel.to_string(),
            query.oldest,
            query.latest,
            cursor.map(str::to_string),
        ));
        self.history
            .borrow_mut()
            .get_mut(query.channel)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(empty)
    }

    async fn conversations_replies(
        &self,
        channel: &str,
        ts: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Message>> {
        self.replies_calls.borrow_mut().push((
            channel.to_string(),
            ts.to_string(),
            cursor.map(str::to_string),
        ));
        self.replies
            .borrow_mut()
            .get_mut(ts)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(empty)
    }
}
