//! Messages exchanged with the dispatcher.
//!
//! Outbound traffic is always a [`Command`]. Inbound traffic is demultiplexed
//! from the [`Inbound`] union: responses correlate back to a command by id,
//! questions and events arrive unsolicited, and `Closed` is the terminal
//! notification after which nothing else is delivered.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::{CorrelationId, ResultCode};

/// Command submitted to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Correlation id for the eventual response.
    pub id: CorrelationId,
    /// Method name the dispatcher routes on.
    pub method: String,
    /// Method parameters as a JSON object.
    #[serde(default)]
    pub params: Value,
}

/// Response to a previously submitted command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id of the command this responds to.
    pub id: CorrelationId,
    /// Outcome of the operation.
    pub code: ResultCode,
    /// Result payload, opaque to the correlation layer.
    #[serde(default)]
    pub params: Value,
}

/// Interactive question raised by the dispatcher mid-operation. The caller
/// must answer it, keyed by `request_id`, before the underlying operation
/// proceeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Identity of the object the question concerns.
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub params: Value,
}

/// Unsolicited notification that is not a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub topic: String,
    #[serde(default)]
    pub params: Value,
}

/// Discriminated union of everything the dispatcher delivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    /// Response message (has `id` and `code` fields).
    Response(Response),
    /// Question message (has `requestId` field).
    Question(Question),
    /// Notification event (has `topic` field).
    Event(Notification),
    /// Terminal connection-closed notification.
    Closed,
}
