//! Helpers around Slack's use of OAuth Bearer Authentication.

/// A newtype wrapper around Slack access tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SlackAccessToken(pub String);

/// Convert a Slack access token to a `Bearer` `Authorization` header value.
pub fn to_auth_header_val(t: &SlackAccessToken) -> String {
    format!("Bearer {}", t.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_auth_header_val() {
        let token = SlackAccessToken("xoxp-foo".into());
        assert_eq!(to_auth_header_val(&token), "Bearer xoxp-foo");
    }
}
