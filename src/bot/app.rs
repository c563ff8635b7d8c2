//! The bot itself: installer configuration plus the credential and client
//! state shared by every operation.

use super::credentials::{self, Credentials};
use crate::slack::{api::SlackClient, auth::SlackAccessToken};
use std::path::PathBuf;

/// Application context constructed once at startup and shared, behind a
/// mutex, by all request handlers.
pub struct Bot {
    pub(super) client_id: String,
    pub(super) client_secret: String,
    pub(super) cache_path: PathBuf,
    pub(super) credentials: Option<Credentials>,
    pub(super) client: SlackClient,
}

impl Bot {
    /// Build a bot bound to the given API base, picking up any credentials a
    /// previous installation cached on disk.
    pub fn new(
        api_base: String,
        client_id: String,
        client_secret: String,
        cache_path: PathBuf,
    ) -> Self {
        let credentials = credentials::load(&cache_path);
        let token = credentials
            .as_ref()
            .map(|c| SlackAccessToken(c.access_token.clone()));

        Bot {
            client_id,
            client_secret,
            cache_path,
            credentials,
            client: SlackClient::new(api_base, token),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The credentials from the last successful exchange or cache load, if
    /// the app has been installed at all yet.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}
