//! Webhook endpoint handler.
//!
//! A single fallback handler serves every path and method:
//! 1. Anything that is not a POST answers the liveness probe
//! 2. POSTs are verified against the Trello webhook signature
//! 3. The payload is normalized and, unless suppressed, posted to the room
//!
//! Responses always carry a JSON body terminated by a newline, and every
//! request gets exactly one response no matter how mangled the payload is.

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::event::normalize;
use crate::notify::Notifier;
use crate::web::signature::{verify_trello_signature, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: Arc::new(config),
            notifier,
        }
    }
}

// =============================================================================
// Response bodies
// =============================================================================

/// Body answered to non-POST requests.
#[derive(Serialize)]
pub struct AliveResponse {
    pub alive: bool,
}

/// Body answered to every POST.
#[derive(Serialize)]
pub struct ApiResponse {
    pub code: u16,
    pub ok: bool,
    pub message: String,
}

impl ApiResponse {
    fn success() -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            ok: true,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            ok: false,
            message: message.into(),
        }
    }
}

const SUCCESS_MESSAGE: &str = "EVERYTHING is COOL";
const UNVERIFIED_MESSAGE: &str = "You are not Trello, stop frontin' and gtfo. -_-;";
const NOT_JSON_MESSAGE: &str = "That is not JSON. C'mon Trello you're better than this.";
const EMPTY_ERROR_MESSAGE: &str = "FLAGRANT ERROR";

// =============================================================================
// Webhook handler
// =============================================================================

/// Catch-all webhook endpoint.
///
/// Trello probes the callback URL with non-POST requests when the webhook
/// is registered, so those answer a plain liveness body on any path.
pub async fn receive_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        debug!(method = %method, "liveness_probe");
        return respond(StatusCode::OK, &AliveResponse { alive: true });
    }

    info!(content_length = body.len(), "webhook_received");

    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if !verify_trello_signature(
        &body,
        provided,
        &state.config.trello_secret,
        &state.config.callback_url,
    ) {
        warn!("webhook_unverified");
        return respond(
            StatusCode::UNAUTHORIZED,
            &ApiResponse::failure(StatusCode::UNAUTHORIZED, UNVERIFIED_MESSAGE),
        );
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "webhook_body_not_json");
            return respond(
                StatusCode::BAD_REQUEST,
                &ApiResponse::failure(StatusCode::BAD_REQUEST, NOT_JSON_MESSAGE),
            );
        }
    };

    let notification = normalize(Some(&payload));

    if notification.suppress {
        info!("notification_suppressed");
        return respond(StatusCode::OK, &ApiResponse::success());
    }

    match state.notifier.send(&notification).await {
        Ok(()) => {
            info!("notification_delivered");
            respond(StatusCode::OK, &ApiResponse::success())
        }
        Err(err) => {
            error!(error = %err, "notifier_send_failed");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, failure_text(&err)),
            )
        }
    }
}

/// Serialize a response body as JSON with the trailing newline Trello's
/// delivery log expects.
fn respond<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    let mut body = match serde_json::to_string(payload) {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, "response_serialize_failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    body.push('\n');

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Error text for the 500 body; a blank error still gets a message.
fn failure_text(err: &impl Display) -> String {
    let text = err.to_string();
    if text.is_empty() {
        EMPTY_ERROR_MESSAGE.to_string()
    } else {
        text
    }
}
