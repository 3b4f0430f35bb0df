//! Inbound message classification.
//!
//! Every decoded message maps to exactly one [`Message`] variant. Shapes
//! that match nothing end up in [`Message::Unrecognized`] so the caller
//! has to decide what to do with them.
//!
//! | Shape | Variant |
//! |-------|---------|
//! | `id` + `method`, no `type`, no `result` | [`Message::Command`] |
//! | any other object with an integer `id` | [`Message::Response`] |
//! | no `id`, `method` | [`Message::Event`] |
//! | anything else | [`Message::Unrecognized`] |
//!
//! Responses are read leniently: a missing or unknown `type` counts as
//! success. Only `"error"` responses need string `error`/`message` fields.
//! A malformed message whose `id` is still an integer keeps that id in
//! [`Unrecognized::id`], so the call waiting on it can be failed.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;

use crate::identifiers::CommandId;

use super::{Command, Event, Response, ResponseType};

// ============================================================================
// Message
// ============================================================================

/// A classified protocol message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Command carrying an id and a method.
    Command(Command),
    /// Response to a command.
    Response(Response),
    /// Unsolicited notification.
    Event(Event),
    /// Matches none of the known shapes.
    Unrecognized(Unrecognized),
}

impl Message {
    /// Decodes JSON text and classifies it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `text` is not valid JSON.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(classify(value))
    }

    /// Returns the kind of this message.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Command(_) => MessageKind::Command,
            Self::Response(_) => MessageKind::Response,
            Self::Event(_) => MessageKind::Event,
            Self::Unrecognized(_) => MessageKind::Unrecognized,
        }
    }
}

// ============================================================================
// MessageKind
// ============================================================================

/// Discriminator of [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// See [`Message::Command`].
    Command,
    /// See [`Message::Response`].
    Response,
    /// See [`Message::Event`].
    Event,
    /// See [`Message::Unrecognized`].
    Unrecognized,
}

// ============================================================================
// Unrecognized
// ============================================================================

/// A message that could not be classified.
#[derive(Debug, Clone, PartialEq)]
pub struct Unrecognized {
    /// The decoded message.
    pub raw: Value,
    /// Command id the message carried, if it was an integer.
    pub id: Option<CommandId>,
    /// Why classification failed.
    pub reason: String,
}

impl Unrecognized {
    fn new(raw: Value, reason: impl Into<String>) -> Self {
        Self {
            raw,
            id: None,
            reason: reason.into(),
        }
    }

    fn with_id(raw: Value, id: CommandId, reason: impl Into<String>) -> Self {
        Self {
            raw,
            id: Some(id),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Classifies a decoded message.
#[must_use]
pub fn classify(value: Value) -> Message {
    let Some(object) = value.as_object() else {
        return Message::Unrecognized(Unrecognized::new(value, "message is not a JSON object"));
    };

    let Some(id_value) = object.get("id") else {
        if !object.contains_key("method") {
            return Message::Unrecognized(Unrecognized::new(
                value,
                "message has neither id nor method",
            ));
        }
        return match Event::deserialize(&value) {
            Ok(event) => Message::Event(event),
            Err(e) => {
                let reason = format!("malformed event: {e}");
                Message::Unrecognized(Unrecognized::new(value, reason))
            }
        };
    };

    let Some(id) = id_value.as_u64().map(CommandId::new) else {
        let reason = format!("id is not a command id: {id_value}");
        return Message::Unrecognized(Unrecognized::new(value, reason));
    };

    let is_command = object.contains_key("method")
        && !object.contains_key("type")
        && !object.contains_key("result");
    if is_command {
        return match Command::deserialize(&value) {
            Ok(command) => Message::Command(command),
            Err(e) => {
                let reason = format!("malformed command: {e}");
                Message::Unrecognized(Unrecognized::with_id(value, id, reason))
            }
        };
    }

    match read_response(id, object) {
        Ok(response) => Message::Response(response),
        Err(reason) => Message::Unrecognized(Unrecognized::with_id(value, id, reason)),
    }
}

fn read_response(id: CommandId, object: &Map<String, Value>) -> StdResult<Response, String> {
    let is_error = match object.get("type") {
        None => false,
        Some(Value::String(kind)) => kind == "error",
        Some(other) => return Err(format!("malformed response: type is {other}")),
    };

    if !is_error {
        return Ok(Response {
            id,
            response_type: ResponseType::Success,
            result: object.get("result").cloned(),
            error: None,
            message: None,
        });
    }

    Ok(Response {
        id,
        response_type: ResponseType::Error,
        result: None,
        error: optional_string(object, "error")?,
        message: optional_string(object, "message")?,
    })
}

fn optional_string(object: &Map<String, Value>, key: &str) -> StdResult<Option<String>, String> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(format!("malformed error response: {key} is {other}")),
    }
}

// ============================================================================
// Tests
// ============================================================================
