//! Canned responses for the friend-request buttons.

use crate::slack::message::Attachment;
use serde::Serialize;
use url::Url;

/// The ephemeral payload handed back to Slack in response to a button press,
/// shown only to whoever pressed it.
///
/// <https://api.slack.com/legacy/message-buttons>
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    as_user: bool,
    replace_original: bool,
    response_type: String,
    text: String,
    attachments: Vec<Attachment>,
}

/// Map a pressed button's value to its canned response. Values we never put
/// on a button yield a diagnostic for the caller to hand back as-is.
pub fn respond(value: &str) -> Result<ActionResponse, String> {
    match value {
        "yes" => Ok(yes_frend()),
        "no" => Ok(no_frend()),
        "maybe" => Ok(maybe_frend()),
        _ => Err(format!("No handler found for '{}' answer.", value)),
    }
}

fn yes_frend() -> ActionResponse {
    ephemeral(
        "HOORAY I LUFF U",
        "https://www.rover.com/blog/wp-content/uploads/2019/05/heck.png",
    )
}

fn no_frend() -> ActionResponse {
    ephemeral(
        "o noooo y not :c",
        "https://vetstreet.brightspotcdn.com/ad/e9/8522224b4d0eb9b8f372726d4725/basset-hound.jpg",
    )
}

fn maybe_frend() -> ActionResponse {
    ephemeral("Ohhh u b playin coy :p", "https://i.imgur.com/vFKjdJY.jpg?1")
}

fn ephemeral(text: &str, img_url: &str) -> ActionResponse {
    ActionResponse {
        as_user: false,
        replace_original: false,
        response_type: "ephemeral".into(),
        text: text.into(),
        attachments: vec![Attachment {
            // The URLs are fixed at build time; a malformed one just drops
            // the image from the reply.
            image_url: Url::parse(img_url).ok(),
            attachment_type: Some("default".into()),
            ..Attachment::default()
        }],
    }
}
