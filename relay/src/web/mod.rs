//! Web server module for the inbound webhook.
//!
//! This module provides a thin web server that:
//! - Answers Trello's registration probes on every path
//! - Verifies the webhook signature before trusting a payload
//! - Normalizes board events and forwards them to the chat room
//!
//! The whole surface is one fallback route; Trello is the only caller.

pub mod handlers;
pub mod signature;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use handlers::{receive_webhook, AliveResponse, ApiResponse, AppState};
pub use signature::{verify_trello_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .fallback(receive_webhook)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
