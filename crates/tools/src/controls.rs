//! Look and basic control tools: `moveControl`, `lookAt`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{ControlState, Session, ToolOutcome, Vec3};
use serde::Deserialize;

use crate::{XyzArgs, coords, xyz_schema};

/// A `moveControl` action: a control key, or `stop` to release all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum MoveAction {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
    Stop,
}

impl MoveAction {
    fn control(self) -> Option<ControlState> {
        match self {
            MoveAction::Forward => Some(ControlState::Forward),
            MoveAction::Back => Some(ControlState::Back),
            MoveAction::Left => Some(ControlState::Left),
            MoveAction::Right => Some(ControlState::Right),
            MoveAction::Jump => Some(ControlState::Jump),
            MoveAction::Sprint => Some(ControlState::Sprint),
            MoveAction::Sneak => Some(ControlState::Sneak),
            MoveAction::Stop => None,
        }
    }
}

impl fmt::Display for MoveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.control() {
            Some(control) => fmt::Display::fmt(&control, f),
            None => f.write_str("stop"),
        }
    }
}

fn default_duration() -> f64 {
    1.0
}

#[derive(Deserialize)]
struct MoveControlArgs {
    action: MoveAction,
    #[serde(default = "default_duration")]
    duration: f64,
}

pub struct MoveControlTool {
    session: Arc<Session>,
}

impl MoveControlTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for MoveControlTool {
    fn name(&self) -> &str {
        "moveControl"
    }

    fn description(&self) -> &str {
        "Control the player with basic movement commands"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["forward", "back", "left", "right", "jump", "sprint", "sneak", "stop"],
                    "description": "Movement action to perform"
                },
                "duration": {
                    "type": "number",
                    "default": 1,
                    "description": "Duration to perform the action in seconds"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: MoveControlArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some(control) = args.action.control() else {
            client.clear_control_states();
            return Ok(ToolOutcome::ok("All movement stopped"));
        };

        client.set_control_state(control, true);
        let hold = Duration::try_from_secs_f64(args.duration).unwrap_or(Duration::ZERO);
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            client.set_control_state(control, false);
        });

        Ok(ToolOutcome::ok(format!(
            "Performing action: {} for {} seconds",
            args.action, args.duration
        )))
    }
}

pub struct LookAtTool {
    session: Arc<Session>,
}

impl LookAtTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for LookAtTool {
    fn name(&self) -> &str {
        "lookAt"
    }

    fn description(&self) -> &str {
        "Make the player look in a specific direction or at coordinates"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        xyz_schema(" to look at")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let XyzArgs { x, y, z } = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        Ok(match client.look_at(Vec3::new(x, y, z)).await {
            Ok(()) => ToolOutcome::ok(format!("Looking at coordinates: {}", coords(x, y, z))),
            Err(e) => e.into(),
        })
    }
}
