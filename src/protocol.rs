//! JSON bodies exchanged over `POST /api/chat`.
//!
//! Shared by the widget's HTTP transport and the server handler so both
//! sides agree on one wire format.

use serde::{Deserialize, Serialize};

use crate::widget::Message;

/// Path of the chat endpoint, relative to the server root.
pub const CHAT_PATH: &str = "/api/chat";

/// Request body: prior conversation plus the new query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Turns exchanged before this query.
    #[serde(default)]
    pub history: Vec<Message>,
    /// The user's new question.
    #[serde(default)]
    pub query: String,
}

/// Successful response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text.
    pub response: String,
}

/// Failure response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description of what went wrong.
    pub error: String,
}
