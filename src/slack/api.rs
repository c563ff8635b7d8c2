//! Type definitions and helpers for the Slack API.

use super::auth::*;
use serde::Deserialize;

/// The base URL of the Slack API.
pub const API_BASE: &str = "https://slack.com/api";

/// A reusable client that holds a connection pool internally, as per
/// [reqwest::Client], plus the access token it is currently bound to.
///
/// The token starts out absent; whoever owns the client binds a fresh one by
/// swapping the client out once an OAuth exchange has produced it.
pub struct SlackClient {
    base_url: String,
    token: Option<SlackAccessToken>,
    http: reqwest::Client,
}

impl SlackClient {
    pub fn new(base_url: String, token: Option<SlackAccessToken>) -> Self {
        SlackClient {
            base_url,
            token,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a GET request to any Slack API endpoint, handling
    /// authentication.
    pub(super) fn get<T: ToString>(&self, path: T) -> reqwest::RequestBuilder {
        self.authed(self.http.get(self.base_url.to_owned() + &path.to_string()))
    }

    /// Create a POST request to any Slack API endpoint, handling
    /// authentication.
    pub(super) fn post<T: ToString>(&self, path: T) -> reqwest::RequestBuilder {
        self.authed(self.http.post(self.base_url.to_owned() + &path.to_string()))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.header(reqwest::header::AUTHORIZATION, to_auth_header_val(t)),
            None => req,
        }
    }
}

/// Slack's API returns a common "untagged" response, representing whether a
/// request was successful.
///
/// ```json
/// {
///     "ok": true,
///     "messages": []
/// }
/// ```
///
/// ```json
/// {
///     "ok": false,
///     "error": "invalid_auth"
/// }
/// ```
#[derive(Deserialize)]
#[serde(untagged)]
pub enum APIResult<T> {
    Ok(T),
    Err(ErrorResponse),
}

/// The universal response in case of an unsuccessful request.
// The `ok` field is checked here, and should be checked on responses too,
// primarily to ensure appropriate deserialization behaviour in case of an
// otherwise empty successful response.
//
// Ideally we'd be able to use `ok` as a tag, rather than defining `APIResult`
// as untagged. See:
//   <https://github.com/serde-rs/serde/issues/745#issuecomment-294314786>
#[derive(Deserialize)]
pub struct ErrorResponse {
    #[allow(dead_code)]
    #[serde(deserialize_with = "crate::de::only_false")]
    ok: bool,
    pub error: String,
}
