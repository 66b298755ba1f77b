//! Event classification for Trello webhook payloads.
//!
//! Trello identifies the activity a webhook describes with a string in
//! `action.type`. The set of types is not exhaustively documented and grows
//! over time, so classification maps the strings we understand onto an
//! explicit enum and preserves anything else verbatim in `Unknown`. Payloads
//! that do not even carry an `action.type` classify as `Malformed`.

use std::fmt;

use serde_json::Value;
use tracing::warn;

/// The normalized classification of one webhook payload.
///
/// Exactly one kind is assigned per payload, and assignment never touches
/// any field that could be missing beyond `action.type` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A checklist was added to a card.
    AddChecklistToCard,
    /// A label was added to a card.
    AddLabelToCard,
    /// A member was added to a card.
    AddMemberToCard,
    /// A member was removed from a card.
    RemoveMemberFromCard,
    /// A comment was posted on a card.
    CommentCard,
    /// A card was created.
    CreateCard,
    /// A checklist item was added to a card.
    CreateCheckItem,
    /// A checklist item was removed from a card.
    DeleteCheckItem,
    /// A comment was deleted.
    DeleteComment,
    /// A card field changed (due date, description, position, list, name, ...).
    UpdateCard,
    /// A checklist item was edited.
    UpdateCheckItem,
    /// A checklist item was checked or unchecked.
    UpdateCheckItemStateOnCard,
    /// A comment was edited.
    UpdateComment,
    /// An action type we have no template for; carries the verbatim type.
    Unknown(String),
    /// The payload lacks `action.type` entirely (or is not an object at all).
    Malformed,
}

impl EventKind {
    /// Map a raw `action.type` string onto a kind.
    pub fn from_type(raw: &str) -> Self {
        match raw {
            "addChecklistToCard" => Self::AddChecklistToCard,
            "addLabelToCard" => Self::AddLabelToCard,
            "addMemberToCard" => Self::AddMemberToCard,
            "removeMemberFromCard" => Self::RemoveMemberFromCard,
            "commentCard" => Self::CommentCard,
            "createCard" => Self::CreateCard,
            "createCheckItem" => Self::CreateCheckItem,
            "deleteCheckItem" => Self::DeleteCheckItem,
            "deleteComment" => Self::DeleteComment,
            "updateCard" => Self::UpdateCard,
            "updateCheckItem" => Self::UpdateCheckItem,
            "updateCheckItemStateOnCard" => Self::UpdateCheckItemStateOnCard,
            "updateComment" => Self::UpdateComment,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire-format action type this kind corresponds to.
    pub fn as_type(&self) -> &str {
        match self {
            Self::AddChecklistToCard => "addChecklistToCard",
            Self::AddLabelToCard => "addLabelToCard",
            Self::AddMemberToCard => "addMemberToCard",
            Self::RemoveMemberFromCard => "removeMemberFromCard",
            Self::CommentCard => "commentCard",
            Self::CreateCard => "createCard",
            Self::CreateCheckItem => "createCheckItem",
            Self::DeleteCheckItem => "deleteCheckItem",
            Self::DeleteComment => "deleteComment",
            Self::UpdateCard => "updateCard",
            Self::UpdateCheckItem => "updateCheckItem",
            Self::UpdateCheckItemStateOnCard => "updateCheckItemStateOnCard",
            Self::UpdateComment => "updateComment",
            Self::Unknown(raw) => raw,
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_type())
    }
}

/// Classify a decoded payload.
///
/// Runs before any template rendering so that a kind exists even when the
/// payload is unusable. Each malformed cause leaves a warn diagnostic.
pub fn classify(payload: Option<&Value>) -> EventKind {
    let Some(payload) = payload else {
        warn!("payload_empty");
        return EventKind::Malformed;
    };

    if payload.get("action").is_none() {
        warn!("payload_missing_action");
        return EventKind::Malformed;
    }

    match payload.pointer("/action/type").and_then(Value::as_str) {
        Some(raw) => EventKind::from_type(raw),
        None => {
            warn!("payload_missing_action_type");
            EventKind::Malformed
        }
    }
}
