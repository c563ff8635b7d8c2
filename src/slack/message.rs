//! Send messages, optionally carrying interactive attachments, to any given
//! Slack channel.

use super::{api::*, channel::ChannelId, error::SlackError};
use serde::{Deserialize, Serialize};
use url::Url;

/// <https://api.slack.com/methods/chat.postMessage#args>
#[derive(Serialize)]
struct MessageRequest<'a> {
    channel: &'a ChannelId,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
}

/// Slack's legacy attachment format, which still powers message buttons.
/// Only the fields this bot sends are modelled; absent ones stay off the
/// wire.
///
/// <https://api.slack.com/reference/messaging/attachments>
#[derive(Clone, Debug, Default, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Url>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

/// A button within an [Attachment]. Clicks come back to us on the
/// interactive-callback route carrying `value`.
#[derive(Clone, Debug, Serialize)]
pub struct Action {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// <https://api.slack.com/methods/chat.postMessage#examples>
#[derive(Deserialize)]
struct MessageResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_true")]
    ok: bool,
}

impl SlackClient {
    /// Post a message in a channel.
    pub async fn post_message(
        &self,
        channel: &ChannelId,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), SlackError> {
        let res: APIResult<MessageResponse> = self
            .post("/chat.postMessage")
            .json(&MessageRequest {
                channel,
                text,
                attachments,
            })
            .send()
            .await?
            .json()
            .await?;

        match res {
            APIResult::Ok(_) => Ok(()),
            APIResult::Err(res) => Err(SlackError::APIResponseError(res.error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_absent_fields_stay_off_the_wire() {
        let attachment = Attachment {
            text: Some("yus/no/mebbe".into()),
            ..Attachment::default()
        };

        assert_eq!(
            serde_json::to_value(&attachment).unwrap(),
            serde_json::json!({ "text": "yus/no/mebbe" })
        );
    }

    #[test]
    fn test_message_request_without_attachments() {
        let channel = ChannelId("C024BE91L".into());
        let req = MessageRequest {
            channel: &channel,
            text: "hi",
            attachments: Vec::new(),
        };

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({ "channel": "C024BE91L", "text": "hi" })
        );
    }

    #[tokio::test]
    async fn test_post_message_error() {
        let msg_res = r#"{
            "ok": false,
            "error": "channel_not_found"
        }"#;

        let mut srv = mockito::Server::new_async().await;

        let msg_mock = srv
            .mock("POST", "/chat.postMessage")
            .with_body(msg_res)
            .create_async()
            .await;

        let client = SlackClient::new(srv.url(), None);
        let res = client
            .post_message(&ChannelId("C024BE91L".into()), "hi", Vec::new())
            .await;

        msg_mock.assert_async().await;

        match res {
            Err(SlackError::APIResponseError(e)) => assert_eq!(e, "channel_not_found"),
            _ => panic!("expected an API response error"),
        }
    }
}
