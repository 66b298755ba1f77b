//! HipChat room client (v1 `rooms/message` API).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::event::Notification;

use super::{Notifier, NotifyError};

/// Sender name shown next to every message in the room.
const POSTED_FROM: &str = "Trello";

/// Posted when a notification somehow arrives without a message body.
const MISSING_MESSAGE: &str = "This webhook was somehow triggered without a message. (why oh why \
     isn't there a message??)";

/// A single HipChat room, addressed through the v1 REST API.
#[derive(Debug)]
pub struct HipChatRoom {
    client: Client,
    endpoint: Url,
    token: String,
    room_id: String,
}

impl HipChatRoom {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.hipchat_api_base)
            .and_then(|base| base.join("v1/rooms/message"))
            .with_context(|| {
                format!("invalid HipChat API base `{}`", config.hipchat_api_base)
            })?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .context("failed to build HipChat HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            token: config.hipchat_token.clone(),
            room_id: config.hipchat_room.clone(),
        })
    }
}

#[async_trait]
impl Notifier for HipChatRoom {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .query(&[("auth_token", self.token.as_str()), ("format", "json")])
            .form(&[
                ("room_id", self.room_id.as_str()),
                ("from", POSTED_FROM),
                ("message", outgoing_text(notification)),
                ("message_format", "html"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, room_id = %self.room_id, "hipchat_message_posted");
            Ok(())
        } else {
            warn!(status = %status, room_id = %self.room_id, "hipchat_message_rejected");
            Err(NotifyError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}

fn outgoing_text(notification: &Notification) -> &str {
    notification.message.as_deref().unwrap_or(MISSING_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_base: &str) -> Config {
        Config {
            trello_secret: "shh".to_string(),
            callback_url: "https://relay.example.com/webhook".to_string(),
            hipchat_token: "token123".to_string(),
            hipchat_room: "42".to_string(),
            hipchat_api_base: api_base.to_string(),
            port: 8080,
            request_timeout_ms: 8000,
        }
    }

    fn notification(message: Option<&str>) -> Notification {
        Notification {
            message: message.map(str::to_string),
            suppress: false,
            raw: json!({}),
        }
    }

    #[tokio::test]
    async fn test_posts_form_encoded_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/rooms/message"))
            .and(query_param("auth_token", "token123"))
            .and(query_param("format", "json"))
            .and(body_string_contains("room_id=42"))
            .and(body_string_contains("from=Trello"))
            .and(body_string_contains("message_format=html"))
            .and(body_string_contains("message=%3Cb%3Ehi%3C%2Fb%3E"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let room = HipChatRoom::new(&test_config(&server.uri())).unwrap();

        room.send(&notification(Some("<b>hi</b>"))).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_message_posts_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/rooms/message"))
            .and(body_string_contains("why+oh+why+isn"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let room = HipChatRoom::new(&test_config(&server.uri())).unwrap();

        room.send(&notification(None)).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let room = HipChatRoom::new(&test_config(&server.uri())).unwrap();

        let err = room
            .send(&notification(Some("hello")))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Rejected { status: 401 }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // The .invalid TLD is reserved and never resolves (RFC 2606).
        let room = HipChatRoom::new(&test_config("http://nonexistent.invalid")).unwrap();

        let err = room
            .send(&notification(Some("hello")))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Transport(_)));
    }

    #[test]
    fn test_invalid_api_base_rejected_up_front() {
        let err = HipChatRoom::new(&test_config("not a url")).unwrap_err();

        assert!(err.to_string().contains("invalid HipChat API base"));
    }
}
