//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables at startup. The four
//! integration values (webhook secret, callback URL, HipChat credentials)
//! are mandatory; everything else has a default.

use std::env;

use anyhow::bail;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret Trello signs webhook deliveries with
    pub trello_secret: String,

    /// Callback URL this webhook was registered under; part of the
    /// signature input, so it must match the registration exactly
    pub callback_url: String,

    /// HipChat API auth token
    pub hipchat_token: String,

    /// HipChat room id to post notifications to
    pub hipchat_room: String,

    /// Base URL of the HipChat API
    pub hipchat_api_base: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// HTTP request timeout in milliseconds for notifier calls
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when any required variable is missing or blank; the rest fall
    /// back to their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            trello_secret: require("TRELLO_SECRET")?,

            callback_url: require("CALLBACK_URL")?,

            hipchat_token: require("HIPCHAT_TOKEN")?,

            hipchat_room: require("HIPCHAT_ROOM")?,

            hipchat_api_base: env::var("HIPCHAT_API_BASE")
                .unwrap_or_else(|_| "https://api.hipchat.com".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        })
    }
}

/// Read an environment variable that has no usable default.
fn require(name: &'static str) -> anyhow::Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("missing required environment variable {name}"),
    }
}
