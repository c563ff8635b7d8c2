//! Inbound payloads delivered by Slack: Events API callbacks and
//! interactive-button submissions.
//!
//! Requests are validated by a signing secret. See [super::signing].
//!
//! <https://api.slack.com/apis/connections/events-api>

use super::{channel::ChannelId, user::UserId};
use serde::Deserialize;

/// The anticipated payload supplied by Slack in event requests.
///
/// Slack sends a one-off `url_verification` handshake when the events URL is
/// first configured; everything thereafter arrives as an `event_callback`
/// wrapping the actual event.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum EventPayload {
    #[serde(rename = "url_verification")]
    UrlVerification { challenge: String },
    #[serde(rename = "event_callback")]
    EventCallback { event: Event },
}

/// The events this bot reacts to. Anything else deserializes to
/// [Event::Other] and is acknowledged without action.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "message")]
    Message(MessageEvent),
    #[serde(other)]
    Other,
}

/// A message posted in a channel the bot can see. System and bot messages
/// may carry no `user`, and some subtypes no `text`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageEvent {
    pub channel: ChannelId,
    pub user: Option<UserId>,
    #[serde(default)]
    pub text: String,
    pub ts: String,
}

/// The payload POSTed by Slack when a user clicks a message button.
///
/// <https://api.slack.com/legacy/message-buttons>
#[derive(Debug, PartialEq, Deserialize)]
pub struct InteractionPayload {
    pub actions: Vec<InteractionAction>,
}

/// A single activated button within an [InteractionPayload].
#[derive(Debug, PartialEq, Deserialize)]
pub struct InteractionAction {
    pub value: String,
}
