//! Boardcast - Trello board activity relay.
//!
//! This library backs the `boardcast-web` binary: a webhook receiver that
//! verifies, normalizes, and forwards Trello board events to a HipChat
//! room.
//!
//! ## Architecture
//!
//! ```text
//! Trello webhook → Web Server → normalize → HipChat room
//! ```

pub mod config;
pub mod event;
pub mod notify;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use event::{normalize, EventKind, Notification};
pub use notify::{HipChatRoom, Notifier, NotifyError};
pub use web::AppState;
