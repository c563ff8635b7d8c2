//! Deserialization helpers for Slack's `ok` response envelope.
//!
//! Slack responses carry no tag beyond the `ok` boolean, so the success and
//! error shapes are told apart by forcing `ok` to a known value during
//! deserialization and letting the untagged enum fall through to the other
//! variant. See [crate::slack::api::APIResult].

use serde::de::{Deserialize, Deserializer, Error};

/// Deserialize a `bool` field, accepting only `true`.
pub fn only_true<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    bool::deserialize(deserializer).and_then(|b| {
        if b {
            Ok(b)
        } else {
            Err(Error::custom("invalid bool: false"))
        }
    })
}

/// Deserialize a `bool` field, accepting only `false`.
pub fn only_false<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    bool::deserialize(deserializer).and_then(|b| {
        if b {
            Err(Error::custom("invalid bool: true"))
        } else {
            Ok(b)
        }
    })
}
