//! Error types for mcremote.
//!
//! Uses `thiserror` for ergonomic error definitions. Game failures come from
//! the external client; tool errors are raised at the dispatch boundary.

use thiserror::Error;

/// Failures reported by the external game connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Connection lost: {0}")]
    Disconnected(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Window is no longer open: {0}")]
    WindowClosed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Errors raised while dispatching a tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_bare_message() {
        let err = GameError::Rejected("Cannot reach that block".into());
        assert_eq!(err.to_string(), "Cannot reach that block");
    }

    #[test]
    fn invalid_arguments_names_the_tool() {
        let err = ToolError::InvalidArguments {
            tool_name: "moveTo".into(),
            reason: "missing field `x`".into(),
        };
        assert!(err.to_string().contains("moveTo"));
        assert!(err.to_string().contains("missing field"));
    }
}
