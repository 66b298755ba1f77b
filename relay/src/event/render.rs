//! Message templates for known Trello actions.
//!
//! One template per [`EventKind`], rendered as the HTML fragment HipChat
//! expects (`<strong>`, `<em>`, one permalink anchor). The payload formats
//! are reverse engineered rather than documented, so every field access is
//! fallible: a [`SchemaError`] here never reaches the caller of
//! `normalize()`, it only downgrades the notification to the malformed
//! fallback with a diagnostic.

use chrono::DateTime;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::kind::EventKind;
use super::MALFORMED_MESSAGE;

/// A payload shape deviation hit while rendering a template.
///
/// Expected in normal operation (the upstream schema drifts); always
/// contained by `normalize()`.
#[derive(Debug, Error)]
pub(crate) enum SchemaError {
    #[error("missing or mistyped field `{0}`")]
    Missing(&'static str),
    #[error("`action.data.old` has no changed field")]
    EmptyDiff,
    #[error("unparseable due date `{0}`")]
    UnparseableDueDate(String),
}

/// A rendered notification body plus its delivery disposition.
#[derive(Debug)]
pub(crate) struct Rendered {
    pub(crate) text: String,
    pub(crate) suppress: bool,
}

impl Rendered {
    /// A message the room should see.
    fn forward(text: String) -> Self {
        Self { text, suppress: false }
    }

    /// A message kept for the audit log only.
    fn suppress(text: String) -> Self {
        Self { text, suppress: true }
    }
}

/// Fallback for payloads nothing else could make sense of.
///
/// Logs the whole raw payload so the unknown shape can be reverse
/// engineered later.
pub(crate) fn malformed_fallback(raw: &Value) -> Rendered {
    warn!(raw = %raw, "payload_unparseable");
    Rendered::suppress(MALFORMED_MESSAGE.to_string())
}

/// Render the message for a classified payload.
///
/// Total over [`EventKind`]; `Unknown` and `Malformed` have their own
/// arms, so an unmatched action type can never fall through silently.
pub(crate) fn render(kind: &EventKind, payload: &Value) -> Result<Rendered, SchemaError> {
    match kind {
        EventKind::AddChecklistToCard => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> added a checklist to card <strong>{card}</strong> \
                 on <strong>{board}</strong> {link}"
            )))
        }

        EventKind::AddLabelToCard => {
            let (actor, card, board, link) = subjects(payload)?;
            let label = str_at(payload, "action.data.text")?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> added label <strong>{label}</strong> to card \
                 <strong>{card}</strong> in <strong>{board}</strong> {link}"
            )))
        }

        EventKind::AddMemberToCard => {
            let (actor, card, board, link) = subjects(payload)?;
            let member = member_or_themself(payload, actor)?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> added <strong>{member}</strong> to card \
                 <strong>{card}</strong> on <strong>{board}</strong> {link}"
            )))
        }

        EventKind::RemoveMemberFromCard => {
            let (actor, card, board, link) = subjects(payload)?;
            let member = member_or_themself(payload, actor)?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> removed <strong>{member}</strong> from card \
                 <strong>{card}</strong> on <strong>{board}</strong> {link}"
            )))
        }

        EventKind::CommentCard => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> commented on card <strong>{card}</strong> in \
                 <strong>{board}</strong> {link}"
            )))
        }

        EventKind::CreateCard => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> created card <strong>{card}</strong> in \
                 <strong>{board}</strong> {link}"
            )))
        }

        EventKind::CreateCheckItem => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> added a checklist item to card \
                 <strong>{card}</strong> in <strong>{board}</strong> {link}"
            )))
        }

        EventKind::DeleteCheckItem => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> removed a checklist item from card \
                 <strong>{card}</strong> in <strong>{board}</strong> {link}"
            )))
        }

        EventKind::DeleteComment => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> deleted a comment on card <strong>{card}</strong> \
                 in <strong>{board}</strong> {link}"
            )))
        }

        EventKind::UpdateComment => {
            let (actor, card, board, link) = subjects(payload)?;
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> updated a comment on card <strong>{card}</strong> \
                 in <strong>{board}</strong> {link}"
            )))
        }

        EventKind::UpdateCard => render_card_update(payload),

        EventKind::UpdateCheckItem => {
            let (actor, card, board, link) = subjects(payload)?;
            let item = str_at(payload, "action.data.checkItem.name")?;
            Ok(Rendered::suppress(format!(
                r#"<strong>{actor}</strong> updated checklist item "<em>{item}</em>" in card <strong>{card}</strong> on <strong>{board}</strong> {link}"#
            )))
        }

        EventKind::UpdateCheckItemStateOnCard => {
            let (actor, card, board, link) = subjects(payload)?;
            let item = str_at(payload, "action.data.checkItem.name")?;
            let state = str_at(payload, "action.data.checkItem.state")?;
            let text = format!(
                r#"<strong>{actor}</strong> marked checklist item "<em>{item}</em>" as <em>{state}</em> in card <strong>{card}</strong> on <strong>{board}</strong> {link}"#
            );
            Ok(if state == "complete" {
                Rendered::forward(text)
            } else {
                Rendered::suppress(text)
            })
        }

        EventKind::Unknown(action_type) => {
            let actor = actor(payload)?;
            let board = board(payload)?;
            let link = permalink(payload)?;
            warn!(action_type = %action_type, raw = %payload, "event_type_unparsed");
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> did <strong>SOME UNPARSED ACTION</strong> of type \
                 `{action_type}` in <strong>{board}</strong> {link}"
            )))
        }

        EventKind::Malformed => Ok(malformed_fallback(payload)),
    }
}

/// `updateCard` covers every card-field edit; the changed field arrives as
/// the lone key of the `action.data.old` snapshot. Upstream does not
/// guarantee a canonical single-field diff, so this takes the first key and
/// treats multi-field diffs as best-effort.
fn render_card_update(payload: &Value) -> Result<Rendered, SchemaError> {
    let old = value_at(payload, "action.data.old")
        .and_then(Value::as_object)
        .ok_or(SchemaError::Missing("action.data.old"))?;
    let changed = old.keys().next().ok_or(SchemaError::EmptyDiff)?;

    let (actor, card, board, link) = subjects(payload)?;

    match changed.as_str() {
        "due" => {
            let due = format_due(str_at(payload, "action.data.card.due")?)?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> changed the due date of card \
                 <strong>{card}</strong> to <strong>{due}</strong> in \
                 <strong>{board}</strong> {link}"
            )))
        }

        "desc" => Ok(Rendered::suppress(format!(
            "<strong>{actor}</strong> updated the description in card \
             <strong>{card}</strong> of <strong>{board}</strong> {link}"
        ))),

        "pos" => {
            let before = f64_at(payload, "action.data.old.pos")?;
            let after = f64_at(payload, "action.data.card.pos")?;
            let direction = if after > before { "upward" } else { "downward" };
            Ok(Rendered::suppress(format!(
                "<strong>{actor}</strong> reprioritized card <strong>{card}</strong> \
                 <em>{direction}</em> in <strong>{board}</strong> {link}"
            )))
        }

        "idList" => {
            let from = str_at(payload, "action.data.listBefore.name")?;
            let to = str_at(payload, "action.data.listAfter.name")?;
            Ok(Rendered::forward(format!(
                "<strong>{actor}</strong> moved card <strong>{card}</strong> from list \
                 <strong>{from}</strong> to <strong>{to}</strong> in \
                 <strong>{board}</strong> {link}"
            )))
        }

        "name" => Ok(Rendered::suppress(format!(
            "<strong>{actor}</strong> changed a card's name to <strong>{card}</strong> \
             in <strong>{board}</strong> {link}"
        ))),

        other => {
            warn!(changed_field = other, raw = %payload, "card_update_unparsed");
            Ok(Rendered::suppress(format!(
                r#"<strong>{actor}</strong> updated card <strong>{card}</strong> in unparsed manner "{other}" in <strong>{board}</strong> {link}"#
            )))
        }
    }
}

/// The fields every template interpolates: actor, card, board, permalink.
fn subjects(payload: &Value) -> Result<(&str, &str, &str, String), SchemaError> {
    Ok((
        actor(payload)?,
        card(payload)?,
        board(payload)?,
        permalink(payload)?,
    ))
}

fn actor(payload: &Value) -> Result<&str, SchemaError> {
    str_at(payload, "action.memberCreator.username")
}

fn card(payload: &Value) -> Result<&str, SchemaError> {
    str_at(payload, "action.data.card.name")
}

fn board(payload: &Value) -> Result<&str, SchemaError> {
    str_at(payload, "action.data.board.name")
}

/// The card permalink, already wrapped in its anchor tag.
fn permalink(payload: &Value) -> Result<String, SchemaError> {
    let url = str_at(payload, "model.shortUrl")?;
    Ok(format!(r#"<a href="{url}">{url}</a>"#))
}

/// The affected member's username, or "themself" when the actor is the
/// affected member.
fn member_or_themself<'a>(payload: &'a Value, actor: &str) -> Result<&'a str, SchemaError> {
    let member = str_at(payload, "action.member.username")?;
    Ok(if member == actor { "themself" } else { member })
}

/// Format an ISO-8601 due date the way the room expects, e.g.
/// "Jan 15 @ 10:47 pm". Rendered in the offset the payload carries.
fn format_due(raw: &str) -> Result<String, SchemaError> {
    let due = DateTime::parse_from_rfc3339(raw)
        .map_err(|_| SchemaError::UnparseableDueDate(raw.to_string()))?;
    Ok(due.format("%b %d @ %I:%M %P").to_string())
}

fn value_at<'a>(payload: &'a Value, path: &'static str) -> Option<&'a Value> {
    path.split('.').try_fold(payload, |value, segment| value.get(segment))
}

fn str_at<'a>(payload: &'a Value, path: &'static str) -> Result<&'a str, SchemaError> {
    value_at(payload, path)
        .and_then(Value::as_str)
        .ok_or(SchemaError::Missing(path))
}

fn f64_at(payload: &Value, path: &'static str) -> Result<f64, SchemaError> {
    value_at(payload, path)
        .and_then(Value::as_f64)
        .ok_or(SchemaError::Missing(path))
}
