//! Delivery of normalized notifications to a chat service.
//!
//! The webhook handlers only know the [`Notifier`] trait; the concrete
//! HipChat client lives behind it so tests can swap in a recorder and a
//! different chat backend stays a one-module change.

mod hipchat;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::Notification;

pub use hipchat::HipChatRoom;

/// Errors surfaced by a notifier. Anything here turns the webhook
/// response into a 500 so Trello retries the delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request never completed (connect failure, timeout, ...).
    #[error("chat service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The chat service answered with a non-success status.
    #[error("chat service rejected the message: status {status}")]
    Rejected { status: u16 },
}

/// A sink for normalized notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification to the room.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}
