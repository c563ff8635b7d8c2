//! Identify Slack channels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Because channel names can change, channels are referred to by their
/// underlying ID. Event payloads deliver these directly, and the API expects
/// them back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelId(pub String);

/// Format without the surrounding newtype wrapper.
///
/// ```
/// let x = ChannelId("C024BE91L".into());
/// assert_eq!(format!("{}", x), "C024BE91L");
/// ```
impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
