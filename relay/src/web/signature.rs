//! Trello webhook signature verification.
//!
//! Trello signs webhook requests with HMAC-SHA1 over the raw request body
//! concatenated with the callback URL the webhook was registered with, and
//! delivers the base64-encoded digest in the `X-Trello-Webhook` header.
//! Reference: https://developer.atlassian.com/cloud/trello/guides/rest-api/webhooks/

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tracing::warn;

type HmacSha1 = Hmac<Sha1>;

/// Request header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-trello-webhook";

/// Verify a Trello webhook signature.
///
/// # Arguments
///
/// * `body` - The raw request body, exactly as received
/// * `provided` - The value of the `X-Trello-Webhook` header
/// * `secret` - The shared webhook secret (Trello API secret)
/// * `callback_url` - The callback URL the webhook was registered with
///
/// # Returns
///
/// `true` if `provided` equals base64(HMAC-SHA1(secret, body + callback_url)),
/// `false` otherwise. Never panics and never returns an error; a `false`
/// result means "reject the request", not an internal fault.
pub fn verify_trello_signature(
    body: &[u8],
    provided: &str,
    secret: &str,
    callback_url: &str,
) -> bool {
    // Check for empty inputs
    if provided.is_empty() || secret.is_empty() {
        warn!(
            has_signature = !provided.is_empty(),
            has_secret = !secret.is_empty(),
            "trello_signature_missing_inputs"
        );
        return false;
    }

    // Compute expected signature: base64(HMAC-SHA1(secret, body + callback_url))
    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("trello_signature_invalid_key");
            return false;
        }
    };

    mac.update(body);
    mac.update(callback_url.as_bytes());

    let expected = STANDARD.encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected, provided);

    if !valid {
        warn!(
            expected_length = expected.len(),
            provided_length = provided.len(),
            "trello_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compute the signature the way Trello does.
    fn sign(body: &[u8], secret: &str, callback_url: &str) -> String {
        let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        mac.update(callback_url.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_signature_valid() {
        let body = br#"{"action":{"type":"createCard"}}"#;
        let secret = "keyboard-cat";
        let url = "https://example.com/hooks/trello";

        let signature = sign(body, secret, url);

        assert!(verify_trello_signature(body, &signature, secret, url));
    }

    #[test]
    fn test_verify_signature_tampered_body() {
        let secret = "keyboard-cat";
        let url = "https://example.com/hooks/trello";

        let signature = sign(b"original body", secret, url);

        assert!(!verify_trello_signature(b"tampered body", &signature, secret, url));
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let body = b"some body";
        let url = "https://example.com/hooks/trello";

        let signature = sign(body, "the-real-secret", url);

        assert!(!verify_trello_signature(body, &signature, "a-wrong-secret", url));
    }

    #[test]
    fn test_verify_signature_wrong_callback_url() {
        let body = b"some body";
        let secret = "keyboard-cat";

        let signature = sign(body, secret, "https://example.com/hooks/trello");

        assert!(!verify_trello_signature(
            body,
            &signature,
            secret,
            "https://example.com/other"
        ));
    }

    #[test]
    fn test_verify_signature_missing_inputs() {
        let body = b"some body";
        let url = "https://example.com/hooks/trello";

        assert!(!verify_trello_signature(body, "", "secret", url));
        assert!(!verify_trello_signature(body, "c2lnbmF0dXJl", "", url));
    }

    #[test]
    fn test_verify_signature_garbage_signature() {
        let body = b"some body";

        assert!(!verify_trello_signature(
            body,
            "definitely-not-base64-of-anything",
            "secret",
            "https://example.com/hooks/trello"
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
