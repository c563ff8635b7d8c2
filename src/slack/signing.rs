//! Helpers around Slack's use of a signing secret to authenticate inbound
//! requests.
//!
//! Requests are validated with a secret that's shared with Slack when the
//! app is configured. The secret signs a string made of a version prefix,
//! the request timestamp, and the raw request body, the result of which is
//! included in a header. We'll compare our own signature against it to know
//! if the request really came from Slack.
//!
//! <https://api.slack.com/authentication/verifying-requests-from-slack>

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// A newtype wrapper around the Slack signing secret.
#[derive(Clone)]
pub struct SigningSecret(pub String);

/// How far a request timestamp may drift from our clock before the request
/// is rejected, blunting replay of a captured signature.
const STALE_AFTER_SECS: u64 = 60 * 5;

/// Compare a valid signature for a timestamped payload against that offered
/// alongside it in a request. Requests which fail this predicate, or which
/// don't have a signature at all, should be considered unauthenticated.
pub fn is_valid_signature(
    secret: &SigningSecret,
    timestamp: &str,
    payload: &[u8],
    sig: &str,
) -> bool {
    gen_signature(secret, timestamp, payload).as_deref() == Some(sig)
}

/// Whether a request timestamp is too far from `now` (epoch seconds) to be
/// trusted. Unparseable timestamps are never trusted.
pub fn is_stale(timestamp: &str, now: u64) -> bool {
    match timestamp.parse::<u64>() {
        Ok(ts) => now.abs_diff(ts) > STALE_AFTER_SECS,
        Err(_) => true,
    }
}

/// Generate a valid signature with our secret for a timestamped payload.
pub(crate) fn gen_signature(
    secret: &SigningSecret,
    timestamp: &str,
    payload: &[u8],
) -> Option<String> {
    type HmacSha256 = Hmac<Sha256>;

    HmacSha256::new_from_slice(secret.0.as_bytes())
        .map(|mut mac| {
            mac.update(b"v0:");
            mac.update(timestamp.as_bytes());
            mac.update(b":");
            mac.update(payload);
            format!("v0={}", hex::encode(mac.finalize().into_bytes()))
        })
        .ok()
}
