//! Connection lifecycle tools: `connectToServer`, `disconnectFromServer`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{
    ConnectError, ConnectOptions, DisconnectError, GameConnector, Session, ToolOutcome,
};
use serde::Deserialize;

pub struct ConnectTool {
    session: Arc<Session>,
    connector: Arc<dyn GameConnector>,
    default_port: u16,
    timeout: Duration,
}

impl ConnectTool {
    pub fn new(
        session: Arc<Session>,
        connector: Arc<dyn GameConnector>,
        default_port: u16,
        timeout: Duration,
    ) -> Self {
        Self {
            session,
            connector,
            default_port,
            timeout,
        }
    }
}

#[derive(Deserialize)]
struct ConnectArgs {
    host: String,
    port: Option<u16>,
    username: String,
    password: Option<String>,
    version: Option<String>,
}

#[async_trait]
impl Tool for ConnectTool {
    fn name(&self) -> &str {
        "connectToServer"
    }

    fn description(&self) -> &str {
        "Connect to a Minecraft server with the specified credentials"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "host": { "type": "string", "description": "Minecraft server host address" },
                "port": {
                    "type": "integer",
                    "default": self.default_port,
                    "description": "Minecraft server port"
                },
                "username": { "type": "string", "description": "Minecraft username" },
                "password": {
                    "type": "string",
                    "description": "Minecraft password (if using premium account)"
                },
                "version": { "type": "string", "description": "Minecraft version" }
            },
            "required": ["host", "username"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: ConnectArgs = parse_args(self.name(), arguments)?;
        let options = ConnectOptions {
            host: args.host,
            port: args.port.unwrap_or(self.default_port),
            username: args.username,
            password: args.password,
            version: args.version.filter(|v| !v.is_empty()),
        };

        let outcome = match self
            .session
            .connect(self.connector.as_ref(), options, self.timeout)
            .await
        {
            Ok(params) => ToolOutcome::ok(format!(
                "Successfully connected to {}:{} as {}",
                params.host, params.port, params.username
            )),
            Err(ConnectError::AlreadyConnected) => ToolOutcome::AlreadyConnected,
            Err(ConnectError::InProgress) => {
                ToolOutcome::domain("A connection attempt is already in progress.")
            }
            Err(e @ ConnectError::TimedOut(_)) => ToolOutcome::TimedOut(e.to_string()),
            Err(ConnectError::Game(e)) => e.into(),
        };
        Ok(outcome)
    }
}

pub struct DisconnectTool {
    session: Arc<Session>,
}

impl DisconnectTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for DisconnectTool {
    fn name(&self) -> &str {
        "disconnectFromServer"
    }

    fn description(&self) -> &str {
        "Disconnect from the Minecraft server"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let outcome = match self.session.disconnect().await {
            Ok(()) => ToolOutcome::ok("Successfully disconnected from the server."),
            Err(DisconnectError::NotConnected) => ToolOutcome::NotConnected,
            Err(DisconnectError::Game(e)) => e.into(),
        };
        Ok(outcome)
    }
}
