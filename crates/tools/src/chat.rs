//! Chat tool: `sendChat`.

use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{Session, ToolOutcome};
use serde::Deserialize;

pub struct SendChatTool {
    session: Arc<Session>,
}

impl SendChatTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[derive(Deserialize)]
struct ChatArgs {
    message: String,
}

#[async_trait]
impl Tool for SendChatTool {
    fn name(&self) -> &str {
        "sendChat"
    }

    fn description(&self) -> &str {
        "Send a chat message to the Minecraft server"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Message to send to the server" }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: ChatArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        Ok(match client.chat(&args.message) {
            Ok(()) => ToolOutcome::ok(format!("Message sent: {}", args.message)),
            Err(e) => e.into(),
        })
    }
}
