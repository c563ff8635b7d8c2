//! Respond to users who greet the bot.

use super::{app::Bot, error::BotError};
use crate::slack::event::MessageEvent;
use crate::slack::message::{Action, Attachment};
use crate::slack::user::fmt_mention;

impl Bot {
    /// Greet the author of a message in its channel and ask the eternal
    /// question. Messages with no author (bot and system noise) are skipped.
    pub async fn say_hello(&self, message: &MessageEvent) -> Result<(), BotError> {
        let user = match &message.user {
            Some(u) => u,
            None => return Ok(()),
        };

        let text = format!("Sup, {}.", fmt_mention(user));

        self.client
            .post_message(&message.channel, &text, vec![friend_request()])
            .await
            .map_err(|e| BotError::SayHello(e.to_string()))
    }
}

/// The friend-request attachment. Clicking a button comes back to us on the
/// interactive-callback route, keyed by the button's value.
fn friend_request() -> Attachment {
    Attachment {
        pretext: Some("will u b mi frend?".into()),
        text: Some("yus/no/mebbe".into()),
        callback_id: Some("frend".into()),
        color: Some("#00CC00".into()),
        attachment_type: Some("default".into()),
        actions: vec![
            button("yes", "yus :party_pikachu:"),
            button("no", "no :sad_parrot:"),
            button("maybe", "mebbe :shifty:"),
        ],
        ..Attachment::default()
    }
}

fn button(value: &str, label: &str) -> Action {
    Action {
        name: value.into(),
        text: label.into(),
        kind: "button".into(),
        value: value.into(),
    }
}
