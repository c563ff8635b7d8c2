//! Identify and mention Slack users.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The opaque ID Slack assigns to each user. Message payloads carry these
/// rather than display names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Format without the surrounding newtype wrapper.
impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format a [UserId] to the mention syntax Slack expects, which renders as a
/// highlighted name and notifies its owner.
///
/// <https://api.slack.com/reference/surfaces/formatting#mentioning-users>
pub fn fmt_mention(u: &UserId) -> String {
    format!("<@{}>", u.0)
}
