//! Tool outcomes and the response envelope sent back to the orchestrator.
//!
//! Every action resolves to a [`ToolOutcome`]. The transport renders it into
//! a [`ToolResponse`]: `{ content: [{ type: "text", text }], isError? }`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GameError;

pub const NOT_CONNECTED_TEXT: &str = "Not connected to any server. Connect first.";
pub const ALREADY_CONNECTED_TEXT: &str = "Already connected to a server. Disconnect first.";

/// The discriminated result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The action succeeded.
    Ok(String),

    /// The session has no live connection.
    NotConnected,

    /// `connectToServer` while a connection is already established.
    AlreadyConnected,

    /// An expected condition (item not found, no container open...).
    Domain(String),

    /// The action did not settle in time and was cancelled.
    TimedOut(String),

    /// The game connection or local logic failed unexpectedly.
    Failed(String),
}

impl ToolOutcome {
    pub fn ok(text: impl Into<String>) -> Self {
        Self::Ok(text.into())
    }

    pub fn domain(text: impl Into<String>) -> Self {
        Self::Domain(text.into())
    }

    pub fn failed(err: impl fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }

    /// The text shown to the orchestrator.
    pub fn text(&self) -> String {
        match self {
            Self::Ok(text) | Self::Domain(text) | Self::TimedOut(text) => text.clone(),
            Self::NotConnected => NOT_CONNECTED_TEXT.to_string(),
            Self::AlreadyConnected => ALREADY_CONNECTED_TEXT.to_string(),
            Self::Failed(message) => format!("Error: {message}"),
        }
    }

    /// Whether the envelope carries `isError: true`.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::TimedOut(_) | Self::Failed(_))
    }

    pub fn into_response(self) -> ToolResponse {
        ToolResponse {
            content: vec![Content::Text { text: self.text() }],
            is_error: self.is_error().then_some(true),
        }
    }
}

impl From<GameError> for ToolOutcome {
    fn from(err: GameError) -> Self {
        Self::failed(err)
    }
}

/// A content block in a tool response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// The uniform response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<Content>,

    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResponse {
    /// An error envelope for failures raised before a tool could run.
    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            content: vec![Content::Text {
                text: format!("Error: {message}"),
            }],
            is_error: Some(true),
        }
    }

    /// Concatenated text of all content blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                Content::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_is_error() {
        let json = serde_json::to_value(ToolOutcome::ok("Message sent: hi").into_response()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": [{"type": "text", "text": "Message sent: hi"}]})
        );
    }

    #[test]
    fn canned_session_responses() {
        assert_eq!(ToolOutcome::NotConnected.text(), NOT_CONNECTED_TEXT);
        assert_eq!(ToolOutcome::AlreadyConnected.text(), ALREADY_CONNECTED_TEXT);
        assert!(!ToolOutcome::NotConnected.is_error());
        assert!(!ToolOutcome::domain("Inventory is empty.").is_error());
    }

    #[test]
    fn failures_are_prefixed_and_flagged() {
        let response = ToolOutcome::from(GameError::Rejected("path blocked".into())).into_response();
        assert_eq!(response.text(), "Error: path blocked");
        assert_eq!(response.is_error, Some(true));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isError"], true);
    }

    #[test]
    fn timeouts_are_flagged() {
        let outcome = ToolOutcome::TimedOut("Digging timed out after 30 seconds".into());
        assert!(outcome.is_error());
        assert_eq!(outcome.text(), "Digging timed out after 30 seconds");
    }
}
