//! Information tools: `getNearbyPlayers`, `getServerInfo`.

use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::Tool;
use mcremote_core::{Session, ToolOutcome};

pub struct NearbyPlayersTool {
    session: Arc<Session>,
}

impl NearbyPlayersTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for NearbyPlayersTool {
    fn name(&self) -> &str {
        "getNearbyPlayers"
    }

    fn description(&self) -> &str {
        "Get a list of players nearby"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let me = client.position();
        let username = client.username();
        // Players beyond view distance have no position.
        let nearby: Vec<String> = client
            .players()
            .into_iter()
            .filter(|p| p.username != username)
            .filter_map(|p| {
                let pos = p.position?;
                Some(format!(
                    "{} ({:.2} blocks away)",
                    p.username,
                    pos.distance_to(&me)
                ))
            })
            .collect();

        if nearby.is_empty() {
            return Ok(ToolOutcome::domain("No other players nearby."));
        }
        Ok(ToolOutcome::ok(format!("Nearby players: {}", nearby.join(", "))))
    }
}

pub struct ServerInfoTool {
    session: Arc<Session>,
}

impl ServerInfoTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for ServerInfoTool {
    fn name(&self) -> &str {
        "getServerInfo"
    }

    fn description(&self) -> &str {
        "Get information about the currently connected server"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let (client, params) = {
            let state = self.session.lock().await;
            let Some(client) = state.client() else {
                return Ok(ToolOutcome::NotConnected);
            };
            (client, state.params().clone())
        };

        let game = client.game_info();
        let stat = |v: Option<f32>| v.map_or_else(|| "N/A".to_string(), |v| format!("{v:.1}"));
        Ok(ToolOutcome::ok(format!(
            "Server Info:\n\
             Host: {}\n\
             Port: {}\n\
             Version: {}\n\
             Game Mode: {}\n\
             Difficulty: {}\n\
             Time: {}\n\
             Players Online: {}\n\
             Your Health: {}\n\
             Your Food: {}",
            params.host,
            params.port,
            game.version,
            game.game_mode,
            game.difficulty,
            game.time_of_day,
            game.players_online,
            stat(game.health),
            stat(game.food),
        )))
    }
}
