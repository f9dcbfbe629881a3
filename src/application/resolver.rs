//! Mention-token resolution.
//!
//! Slack encodes mentions inline: `<@U123>` for users, `<U123>` for bare
//! user references and `<!subteam^S123>` for user groups. Each is replaced
//! with a display name, or with the raw id when the id is unknown.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::NameMap;

static USER_MENTION: LazyLock<Regex> = LazyLock::new(|| compile(r"<@([UW][A-Z0-9]+)>"));
static USER_REFERENCE: LazyLock<Regex> = LazyLock::new(|| compile(r"<(U[A-Z0-9]+)>"));
static GROUP_MENTION: LazyLock<Regex> = LazyLock::new(|| compile(r"<!subteam\^([A-Z0-9]+)>"));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("mention pattern is valid")
}

/// Replace mention tokens in `text` with names from `users` and `groups`.
#[must_use]
pub fn resolve_text(text: &str, users: &NameMap, groups: &NameMap) -> String {
    let text = USER_MENTION.replace_all(text, |caps: &Captures<'_>| {
        format!("@{}", users.get_or(&caps[1], &caps[1]))
    });
    let text = USER_REFERENCE.replace_all(&text, |caps: &Captures<'_>| {
        format!("<{}>", users.get_or(&caps[1], &caps[1]))
    });
    let text = GROUP_MENTION.replace_all(&text, |caps: &Captures<'_>| {
        format!("@{}", groups.get_or(&caps[1], &caps[1]))
    });
    text.into_owned()
}
