//! Block tools: `digBlock`, `placeBlock`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{BlockPos, EquipDestination, Face, GameError, Session, ToolOutcome};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{XyzArgs, coords, xyz_schema};

pub struct DigBlockTool {
    session: Arc<Session>,
    timeout: Duration,
}

impl DigBlockTool {
    pub fn new(session: Arc<Session>, timeout: Duration) -> Self {
        Self { session, timeout }
    }
}

#[async_trait]
impl Tool for DigBlockTool {
    fn name(&self) -> &str {
        "digBlock"
    }

    fn description(&self) -> &str {
        "Dig a block at the specified coordinates"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        xyz_schema("")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let XyzArgs { x, y, z } = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some(block) = client
            .block_at(BlockPos::containing(x, y, z))
            .filter(|b| !b.is_air())
        else {
            return Ok(ToolOutcome::domain(
                "No block found at the specified coordinates.",
            ));
        };

        Ok(match tokio::time::timeout(self.timeout, client.dig(&block)).await {
            Ok(Ok(())) => ToolOutcome::ok(format!(
                "Successfully dug {} at {}",
                block.name,
                coords(x, y, z)
            )),
            Ok(Err(e)) => e.into(),
            Err(_) => {
                client.stop_digging();
                warn!(block = %block.name, pos = %block.position, "Digging timed out");
                ToolOutcome::TimedOut(format!(
                    "Digging timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            }
        })
    }
}

pub struct PlaceBlockTool {
    session: Arc<Session>,
}

impl PlaceBlockTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceArgs {
    x: f64,
    y: f64,
    z: f64,
    item_name: String,
}

#[async_trait]
impl Tool for PlaceBlockTool {
    fn name(&self) -> &str {
        "placeBlock"
    }

    fn description(&self) -> &str {
        "Place a block at the specified location"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "x": { "type": "number", "description": "X coordinate" },
                "y": { "type": "number", "description": "Y coordinate" },
                "z": { "type": "number", "description": "Z coordinate" },
                "itemName": { "type": "string", "description": "Name of the item to place" }
            },
            "required": ["x", "y", "z", "itemName"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: PlaceArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some(item) = client
            .inventory_items()
            .into_iter()
            .find(|i| i.is_named(&args.item_name))
        else {
            return Ok(ToolOutcome::domain(format!(
                "Item \"{}\" not found in inventory.",
                args.item_name
            )));
        };

        if let Err(e) = client.equip(&item, EquipDestination::Hand).await {
            return Ok(e.into());
        }

        let target = BlockPos::containing(args.x, args.y, args.z);
        let mut last_error: Option<GameError> = None;
        for face in Face::ALL {
            let Some(reference) = client
                .block_at(target.anchor_for(face))
                .filter(|b| !b.is_air())
            else {
                continue;
            };
            match client.place_block(&reference, face).await {
                Ok(()) => {
                    return Ok(ToolOutcome::ok(format!(
                        "Successfully placed {} at {}",
                        args.item_name,
                        coords(args.x, args.y, args.z)
                    )));
                }
                Err(e) => {
                    debug!(?face, reference = %reference.position, error = %e, "Placement attempt failed");
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            warn!(%target, error = %e, "Every placement face failed");
        }
        Ok(ToolOutcome::domain(format!(
            "Failed to place {}. No suitable surface found or not enough space.",
            args.item_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_gated, connected, run};
    use mcremote_sim::{SimCall, SimOp, SimWorld, item};
    use serde_json::json;

    fn place_calls(world: &SimWorld) -> Vec<SimCall> {
        world.calls_matching(|c| matches!(c, SimCall::Place { .. }))
    }

    #[tokio::test]
    async fn digs_a_solid_block() {
        let world = SimWorld::new();
        world.set_block(BlockPos::new(3, 64, 3), "stone");
        let tool = DigBlockTool::new(connected(&world).await, Duration::from_secs(30));

        let outcome = run(&tool, json!({"x": 3, "y": 64, "z": 3})).await;
        assert_eq!(outcome, ToolOutcome::ok("Successfully dug stone at X=3, Y=64, Z=3"));
        assert_eq!(world.block(BlockPos::new(3, 64, 3)).as_deref(), Some("air"));
        assert_eq!(world.inventory_count("stone"), 1);
    }

    #[tokio::test]
    async fn digging_air_is_a_domain_response() {
        let world = SimWorld::new();
        let tool = DigBlockTool::new(connected(&world).await, Duration::from_secs(30));
        let outcome = run(&tool, json!({"x": 0, "y": 100, "z": 0})).await;
        assert_eq!(
            outcome,
            ToolOutcome::domain("No block found at the specified coordinates.")
        );
        assert!(world.calls_matching(|c| matches!(c, SimCall::Dig(_))).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_dig_is_cancelled_on_timeout() {
        let world = SimWorld::new();
        world.set_block(BlockPos::new(0, 64, 1), "obsidian");
        world.set_dig_delay(Duration::from_secs(250));
        let tool = DigBlockTool::new(connected(&world).await, Duration::from_secs(30));

        let outcome = run(&tool, json!({"x": 0, "y": 64, "z": 1})).await;
        assert_eq!(
            outcome,
            ToolOutcome::TimedOut("Digging timed out after 30 seconds".into())
        );
        assert!(world.calls().contains(&SimCall::StopDigging));

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(world.block(BlockPos::new(0, 64, 1)).as_deref(), Some("obsidian"));
    }

    #[tokio::test]
    async fn places_against_the_floor() {
        let world = SimWorld::new();
        world.set_block(BlockPos::new(5, 63, 5), "grass_block");
        world.give(item("cobblestone", 4));
        let tool = PlaceBlockTool::new(connected(&world).await);

        let outcome = run(
            &tool,
            json!({"x": 5, "y": 64, "z": 5, "itemName": "Cobblestone"}),
        )
        .await;
        assert_eq!(
            outcome,
            ToolOutcome::ok("Successfully placed Cobblestone at X=5, Y=64, Z=5")
        );
        assert_eq!(world.block(BlockPos::new(5, 64, 5)).as_deref(), Some("cobblestone"));
        assert_eq!(
            place_calls(&world),
            vec![SimCall::Place {
                reference: BlockPos::new(5, 63, 5),
                face: Face::Up
            }]
        );
    }

    #[tokio::test]
    async fn open_air_yields_one_aggregate_failure() {
        let world = SimWorld::new();
        world.give(item("dirt", 1));
        let tool = PlaceBlockTool::new(connected(&world).await);

        let outcome = run(&tool, json!({"x": 0, "y": 120, "z": 0, "itemName": "dirt"})).await;
        assert_eq!(
            outcome,
            ToolOutcome::domain("Failed to place dirt. No suitable surface found or not enough space.")
        );
        assert!(!outcome.is_error());
        assert!(place_calls(&world).is_empty());
    }

    #[tokio::test]
    async fn each_face_is_tried_exactly_once() {
        let world = SimWorld::new();
        let target = BlockPos::new(0, 70, 0);
        for face in Face::ALL {
            world.set_block(target.anchor_for(face), "stone");
        }
        world.give(item("dirt", 1));
        world.fail(SimOp::Place, "No block has been placed");
        let tool = PlaceBlockTool::new(connected(&world).await);

        let outcome = run(&tool, json!({"x": 0, "y": 70, "z": 0, "itemName": "dirt"})).await;
        assert!(matches!(outcome, ToolOutcome::Domain(_)));

        let faces: Vec<Face> = place_calls(&world)
            .into_iter()
            .filter_map(|c| match c {
                SimCall::Place { face, .. } => Some(face),
                _ => None,
            })
            .collect();
        assert_eq!(faces, Face::ALL.to_vec());
    }

    #[tokio::test]
    async fn failed_face_falls_through_to_the_next() {
        let world = SimWorld::new();
        let target = BlockPos::new(2, 64, 2);
        world.set_block(target.anchor_for(Face::Up), "stone");
        world.set_block(target.anchor_for(Face::East), "stone");
        world.fail_place_on(Face::Up);
        world.give(item("glass", 1));
        let tool = PlaceBlockTool::new(connected(&world).await);

        let outcome = run(&tool, json!({"x": 2, "y": 64, "z": 2, "itemName": "glass"})).await;
        assert!(matches!(outcome, ToolOutcome::Ok(_)));
        assert_eq!(place_calls(&world).len(), 2);
        assert_eq!(world.block(target).as_deref(), Some("glass"));
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let world = SimWorld::new();
        let tool = PlaceBlockTool::new(connected(&world).await);
        let outcome = run(&tool, json!({"x": 0, "y": 64, "z": 0, "itemName": "tnt"})).await;
        assert_eq!(outcome, ToolOutcome::domain("Item \"tnt\" not found in inventory."));
    }

    #[tokio::test]
    async fn gated_when_disconnected() {
        assert_gated(
            |s| Box::new(DigBlockTool::new(s, Duration::from_secs(30))),
            json!({"x": 3, "y": 64, "z": 3}),
        )
        .await;
        assert_gated(
            |s| Box::new(PlaceBlockTool::new(s)),
            json!({"x": 0, "y": 64, "z": 0, "itemName": "oak_planks"}),
        )
        .await;
    }
}
