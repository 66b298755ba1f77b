//! Normalization of raw Trello webhook payloads into chat notifications.
//!
//! Responsibilities:
//! - Classify the action type carried by a payload ([`EventKind`])
//! - Render the per-type HTML message and delivery disposition
//! - Absorb every malformed or unrecognized shape into a loggable
//!   fallback instead of an error
//!
//! `normalize` is total: whatever the payload looks like (including no
//! payload at all), the caller gets a [`Notification`] back. Payloads we
//! cannot interpret come back with `suppress` set and the raw JSON
//! preserved for the logs.

mod kind;
mod render;

use serde_json::Value;
use tracing::{info, warn};

pub use kind::EventKind;

use kind::classify;
use render::{malformed_fallback, render};

/// Message attached to payloads nothing could make sense of.
pub(crate) const MALFORMED_MESSAGE: &str = "Received a malformed or unparseable POST body from \
     Trello. Look at the logs to see the raw payload.";

/// A normalized board event, ready to hand to a notifier.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The HTML message body. Always present for payloads that went
    /// through `normalize`.
    pub message: Option<String>,
    /// When set, the event is logged but never posted to the room.
    pub suppress: bool,
    /// The payload as received, kept for diagnostics.
    pub raw: Value,
}

/// Turn a raw webhook payload into a [`Notification`].
///
/// Never fails: unknown action types get a placeholder message, and
/// payloads that do not match the expected shape degrade to the
/// malformed fallback with the deviation logged.
pub fn normalize(payload: Option<&Value>) -> Notification {
    let kind = classify(payload);
    let raw = payload.cloned().unwrap_or(Value::Null);

    let rendered = match (&kind, payload) {
        (EventKind::Malformed, _) | (_, None) => malformed_fallback(&raw),
        (kind, Some(payload)) => render(kind, payload).unwrap_or_else(|err| {
            warn!(error = %err, kind = %kind, "payload_shape_unexpected");
            malformed_fallback(payload)
        }),
    };

    let notification = Notification {
        message: Some(rendered.text),
        suppress: rendered.suppress,
        raw,
    };

    match notification.message.as_deref() {
        Some(message) => {
            info!(
                kind = %kind,
                suppress = notification.suppress,
                message = message,
                "event_normalized"
            );
        }
        None => warn!(kind = %kind, "event_normalized_without_message"),
    }

    notification
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card_payload(action_type: &str) -> Value {
        json!({
            "model": { "shortUrl": "https://trello.com/c/a1b2c3" },
            "action": {
                "type": action_type,
                "memberCreator": { "username": "sarah" },
                "data": {
                    "card": { "name": "Ship the relay" },
                    "board": { "name": "Skunkworks" }
                }
            }
        })
    }

    #[test]
    fn test_normalize_forwards_card_creation() {
        let payload = card_payload("createCard");

        let notification = normalize(Some(&payload));

        let message = notification.message.as_deref().unwrap();
        assert!(message.contains("created card <strong>Ship the relay</strong>"));
        assert!(!notification.suppress);
        assert_eq!(notification.raw, payload);
    }

    #[test]
    fn test_normalize_suppresses_checklist_noise() {
        let notification = normalize(Some(&card_payload("addChecklistToCard")));

        assert!(notification.suppress);
        assert!(notification
            .message
            .as_deref()
            .unwrap()
            .contains("added a checklist"));
    }

    #[test]
    fn test_normalize_absent_payload() {
        let notification = normalize(None);

        assert!(notification.suppress);
        assert_eq!(notification.message.as_deref(), Some(MALFORMED_MESSAGE));
        assert_eq!(notification.raw, Value::Null);
    }

    #[test]
    fn test_normalize_payload_without_action() {
        let payload = json!({ "model": { "shortUrl": "https://trello.com/c/a1b2c3" } });

        let notification = normalize(Some(&payload));

        assert!(notification.suppress);
        assert_eq!(notification.message.as_deref(), Some(MALFORMED_MESSAGE));
        assert_eq!(notification.raw, payload);
    }

    #[test]
    fn test_normalize_contains_schema_drift() {
        // Known type, but the fields the template needs are gone.
        let payload = json!({
            "model": { "shortUrl": "https://trello.com/c/a1b2c3" },
            "action": { "type": "createCard" }
        });

        let notification = normalize(Some(&payload));

        assert!(notification.suppress);
        assert_eq!(notification.message.as_deref(), Some(MALFORMED_MESSAGE));
    }

    #[test]
    fn test_normalize_unknown_type_is_placeholder() {
        let notification = normalize(Some(&card_payload("enablePowerUp")));

        assert!(notification.suppress);
        assert!(notification
            .message
            .as_deref()
            .unwrap()
            .contains("SOME UNPARSED ACTION"));
    }

    #[test]
    fn test_normalize_always_produces_a_message() {
        let shapes = [
            json!(null),
            json!(42),
            json!("surprise"),
            json!([1, 2, 3]),
            json!({}),
            json!({ "action": [] }),
            json!({ "action": { "type": 7 } }),
        ];

        for shape in &shapes {
            let notification = normalize(Some(shape));
            assert!(
                notification.message.is_some(),
                "no message for payload {shape}"
            );
            assert!(notification.suppress, "forwarded junk payload {shape}");
        }
    }
}
