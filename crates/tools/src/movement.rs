//! Movement tools: `getPosition`, `moveTo`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{BlockPos, Session, ToolOutcome};
use tracing::warn;

use crate::{XyzArgs, coords, xyz_schema};

pub struct GetPositionTool {
    session: Arc<Session>,
}

impl GetPositionTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for GetPositionTool {
    fn name(&self) -> &str {
        "getPosition"
    }

    fn description(&self) -> &str {
        "Get the current position of the player in the Minecraft world"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };
        let p = client.position();
        Ok(ToolOutcome::ok(format!(
            "Current position: X={:.2}, Y={:.2}, Z={:.2}",
            p.x, p.y, p.z
        )))
    }
}

/// Pathfind to a block. The goal is abandoned if it is not reached within
/// the configured limit.
pub struct MoveToTool {
    session: Arc<Session>,
    timeout: Duration,
}

impl MoveToTool {
    pub fn new(session: Arc<Session>, timeout: Duration) -> Self {
        Self { session, timeout }
    }
}

#[async_trait]
impl Tool for MoveToTool {
    fn name(&self) -> &str {
        "moveTo"
    }

    fn description(&self) -> &str {
        "Move the player to a specific location"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        xyz_schema("")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let XyzArgs { x, y, z } = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let goal = BlockPos::containing(x, y, z);
        Ok(match tokio::time::timeout(self.timeout, client.goto(goal)).await {
            Ok(Ok(())) => ToolOutcome::ok(format!("Successfully moved to {}", coords(x, y, z))),
            Ok(Err(e)) => e.into(),
            Err(_) => {
                client.stop_pathing();
                warn!(%goal, timeout_secs = self.timeout.as_secs(), "Movement timed out");
                ToolOutcome::TimedOut(format!(
                    "Movement timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_gated, connected, run};
    use mcremote_core::Vec3;
    use mcremote_sim::{SimCall, SimOp, SimWorld};
    use serde_json::json;

    #[tokio::test]
    async fn position_has_two_decimals() {
        let world = SimWorld::new();
        world.set_position(Vec3::new(1.0, 64.0, -2.346));
        let tool = GetPositionTool::new(connected(&world).await);
        assert_eq!(
            run(&tool, json!({})).await,
            ToolOutcome::ok("Current position: X=1.00, Y=64.00, Z=-2.35")
        );
    }

    #[tokio::test]
    async fn move_to_reaches_goal() {
        let world = SimWorld::new();
        let tool = MoveToTool::new(connected(&world).await, Duration::from_secs(60));
        let outcome = run(&tool, json!({"x": 10, "y": 64, "z": -4})).await;
        assert_eq!(outcome, ToolOutcome::ok("Successfully moved to X=10, Y=64, Z=-4"));
        assert!(world.calls().contains(&SimCall::Goto(BlockPos::new(10, 64, -4))));
        assert_eq!(world.position(), Vec3::new(10.5, 64.0, -3.5));
    }

    #[tokio::test]
    async fn path_failure_is_reported() {
        let world = SimWorld::new();
        let tool = MoveToTool::new(connected(&world).await, Duration::from_secs(60));
        world.fail(SimOp::Goto, "No path to the goal!");
        let outcome = run(&tool, json!({"x": 0, "y": 64, "z": 0})).await;
        assert_eq!(outcome, ToolOutcome::Failed("No path to the goal!".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_path_is_cancelled_on_timeout() {
        let world = SimWorld::new();
        world.set_goto_delay(Duration::from_secs(120));
        let tool = MoveToTool::new(connected(&world).await, Duration::from_secs(60));

        let outcome = run(&tool, json!({"x": 50, "y": 64, "z": 50})).await;
        assert_eq!(
            outcome,
            ToolOutcome::TimedOut("Movement timed out after 60 seconds".into())
        );
        assert!(world.calls().contains(&SimCall::StopPathing));

        // The abandoned goal never completes.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(world.position(), Vec3::new(0.5, 64.0, 0.5));
    }

    #[tokio::test]
    async fn gated_when_disconnected() {
        assert_gated(
            |s| Box::new(MoveToTool::new(s, Duration::from_secs(60))),
            json!({"x": 1, "y": 2, "z": 3}),
        )
        .await;
        assert_gated(|s| Box::new(GetPositionTool::new(s)), json!({})).await;
    }
}
