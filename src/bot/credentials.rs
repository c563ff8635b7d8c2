//! Owns the OAuth exchange and the on-disk token cache.

use super::{app::Bot, error::BotError};
use crate::slack::{api::SlackClient, auth::SlackAccessToken};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::fs;
use tracing::warn;

/// Where the token cache lives unless `$AUTH_CACHE_PATH` says otherwise.
pub const DEFAULT_CACHE_PATH: &str = "auth_cache.json";

/// The tokens issued by a successful OAuth exchange. A bot either holds a
/// full set or none at all; partial credentials cannot be represented.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// The user ID of the bot identity itself.
    #[serde(rename = "user_id")]
    pub bot_user_id: String,
    pub access_token: String,
    pub bot_access_token: String,
}

/// Read previously cached credentials. A missing cache simply means the app
/// hasn't been installed yet; an unreadable or corrupt one is reported and
/// treated the same way.
pub fn load(path: &Path) -> Option<Credentials> {
    let raw = match fs::read_to_string(path) {
        Ok(x) => x,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Could not read credential cache {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(creds) => Some(creds),
        Err(e) => {
            warn!("Ignoring corrupt credential cache {}: {}", path.display(), e);
            None
        }
    }
}

/// Overwrite the cache with a full credential snapshot. The snapshot lands
/// beside the cache and is renamed into place, so a crash mid-write leaves
/// any previously valid cache intact.
pub fn store(path: &Path, creds: &Credentials) -> io::Result<()> {
    let blob = serde_json::to_string(creds)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    fs::write(&tmp, blob)?;
    fs::rename(&tmp, path)
}

impl Bot {
    /// Exchange a temporary authorization code for tokens, persist them, and
    /// rebind the client to the newly issued access token.
    pub async fn auth(&mut self, code: &str) -> Result<Credentials, BotError> {
        let access = self
            .client
            .oauth_access(&self.client_id, &self.client_secret, code)
            .await
            .map_err(|e| BotError::OAuth(e.to_string()))?;

        let creds = Credentials {
            bot_user_id: access.bot_user_id,
            access_token: access.access_token,
            bot_access_token: access.bot_access_token,
        };

        store(&self.cache_path, &creds).map_err(|e| BotError::OAuth(e.to_string()))?;

        // An explicit reassignment rather than interior mutation; the old
        // client and whatever token it held are dropped here.
        self.client = SlackClient::new(
            self.client.base_url().to_owned(),
            Some(SlackAccessToken(creds.access_token.clone())),
        );
        self.credentials = Some(creds.clone());

        Ok(creds)
    }
}
