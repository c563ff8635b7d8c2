//! Fetch a channel's message history within a time window.

use super::{api::*, channel::ChannelId, error::SlackError, user::UserId};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

/// <https://api.slack.com/methods/conversations.history#args>
#[derive(Serialize)]
struct HistoryRequest<'a> {
    channel: &'a ChannelId,
    /// Epoch seconds; only messages after this point are returned.
    oldest: &'a str,
    /// Epoch seconds; only messages before this point are returned.
    latest: &'a str,
    /// Maximum supported is 999, but a limit of 200 is "recommended".
    limit: u16,
    cursor: Option<String>,
}

/// A single message within [HistoryResponse]. System and bot messages may
/// carry no `user`, and some subtypes no `text`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct HistoryMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: Option<UserId>,
    #[serde(default)]
    pub text: String,
    pub ts: String,
}

/// <https://api.slack.com/methods/conversations.history#examples>
#[derive(Deserialize)]
struct HistoryResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_true")]
    ok: bool,
    messages: Vec<HistoryMessage>,
    #[serde(default)]
    response_metadata: Option<PaginationMeta>,
}

/// The metadata attached to a [HistoryResponse] when further pages remain.
#[serde_as]
#[derive(Deserialize)]
struct PaginationMeta {
    #[serde_as(as = "NoneAsEmptyString")]
    next_cursor: Option<String>,
}

impl SlackClient {
    /// Fetch every message in a channel between `oldest` and `latest`, in
    /// the order Slack returns them (newest first).
    pub async fn fetch_history(
        &self,
        channel: &ChannelId,
        oldest: &str,
        latest: &str,
    ) -> Result<Vec<HistoryMessage>, SlackError> {
        let mut messages: Vec<HistoryMessage> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let res: APIResult<HistoryResponse> = self
                .get("/conversations.history")
                .query(&HistoryRequest {
                    channel,
                    oldest,
                    latest,
                    limit: 200,
                    cursor,
                })
                .send()
                .await?
                .json()
                .await?;

            match res {
                APIResult::Ok(mut res) => {
                    messages.append(&mut res.messages);

                    cursor = res.response_metadata.and_then(|m| m.next_cursor);
                    if cursor.is_some() {
                        continue;
                    }

                    break Ok(messages);
                }
                APIResult::Err(res) => break Err(SlackError::APIResponseError(res.error)),
            }
        }
    }
}
