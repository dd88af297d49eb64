//! Entity tools: `getNearbyEntities`, `attackEntity`, `useOnEntity`,
//! `followEntity`.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{Entity, GameClient, Session, ToolOutcome};
use serde::Deserialize;

fn entity_name(entity: &Entity) -> &str {
    entity.known_name().unwrap_or("Unknown entity")
}

fn not_found(id: i32) -> ToolOutcome {
    ToolOutcome::domain(format!("Entity with ID {id} not found."))
}

fn entity_id_schema(what: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "entityId": { "type": "integer", "description": format!("ID of the entity to {what}") }
        },
        "required": ["entityId"]
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityIdArgs {
    entity_id: i32,
}

/// Group the entities within `range` of the player by kind, keeping the
/// order in which each kind is first seen. The player itself is skipped.
fn group_nearby(client: &dyn GameClient, range: f64) -> Vec<(String, Vec<(Entity, f64)>)> {
    let me = client.position();
    let self_id = client.entity_id();
    let mut groups: Vec<(String, Vec<(Entity, f64)>)> = Vec::new();

    for entity in client.entities() {
        if entity.id == self_id {
            continue;
        }
        let distance = me.distance_to(&entity.position);
        if distance > range {
            continue;
        }
        match groups.iter_mut().find(|(kind, _)| *kind == entity.kind) {
            Some((_, members)) => members.push((entity, distance)),
            None => groups.push((entity.kind.clone(), vec![(entity, distance)])),
        }
    }
    groups
}

pub struct NearbyEntitiesTool {
    session: Arc<Session>,
    default_range: f64,
}

impl NearbyEntitiesTool {
    pub fn new(session: Arc<Session>, default_range: f64) -> Self {
        Self {
            session,
            default_range,
        }
    }
}

#[derive(Deserialize)]
struct RangeArgs {
    range: Option<f64>,
}

#[async_trait]
impl Tool for NearbyEntitiesTool {
    fn name(&self) -> &str {
        "getNearbyEntities"
    }

    fn description(&self) -> &str {
        "Get a list of entities nearby"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "range": {
                    "type": "number",
                    "default": self.default_range,
                    "description": "Range to search for entities"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: RangeArgs = parse_args(self.name(), arguments)?;
        let range = args.range.unwrap_or(self.default_range);
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let groups = group_nearby(client.as_ref(), range);
        if groups.is_empty() {
            return Ok(ToolOutcome::domain("No entities found nearby."));
        }

        let mut out = format!("Entities within {range} blocks:\n\n");
        for (kind, members) in &groups {
            let _ = writeln!(out, "{} ({}):", kind.to_uppercase(), members.len());
            for (entity, distance) in members {
                let name = entity
                    .known_name()
                    .map_or_else(|| format!("Entity #{}", entity.id), str::to_string);
                let _ = writeln!(
                    out,
                    "- {name} ({distance:.1} blocks away, ID: {})",
                    entity.id
                );
            }
            out.push('\n');
        }
        Ok(ToolOutcome::ok(out))
    }
}

pub struct AttackEntityTool {
    session: Arc<Session>,
}

impl AttackEntityTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for AttackEntityTool {
    fn name(&self) -> &str {
        "attackEntity"
    }

    fn description(&self) -> &str {
        "Attack a specific entity"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        entity_id_schema("attack")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let EntityIdArgs { entity_id } = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };
        let Some(entity) = client.entity(entity_id) else {
            return Ok(not_found(entity_id));
        };

        Ok(match client.attack(&entity).await {
            Ok(()) => ToolOutcome::ok(format!(
                "Attacked entity: {} (ID: {entity_id})",
                entity_name(&entity)
            )),
            Err(e) => e.into(),
        })
    }
}

pub struct UseOnEntityTool {
    session: Arc<Session>,
}

impl UseOnEntityTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for UseOnEntityTool {
    fn name(&self) -> &str {
        "useOnEntity"
    }

    fn description(&self) -> &str {
        "Use the held item on a specific entity"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        entity_id_schema("use the held item on")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let EntityIdArgs { entity_id } = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };
        let Some(entity) = client.entity(entity_id) else {
            return Ok(not_found(entity_id));
        };

        if let Err(e) = client.use_on(&entity).await {
            return Ok(e.into());
        }
        let held = client
            .equipment()
            .held
            .map_or_else(|| "hand".to_string(), |i| i.name);
        Ok(ToolOutcome::ok(format!(
            "Used {held} on entity: {} (ID: {entity_id})",
            entity_name(&entity)
        )))
    }
}

pub struct FollowEntityTool {
    session: Arc<Session>,
    default_distance: f64,
}

impl FollowEntityTool {
    pub fn new(session: Arc<Session>, default_distance: f64) -> Self {
        Self {
            session,
            default_distance,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FollowArgs {
    entity_id: i32,
    distance: Option<f64>,
}

#[async_trait]
impl Tool for FollowEntityTool {
    fn name(&self) -> &str {
        "followEntity"
    }

    fn description(&self) -> &str {
        "Follow a specific entity"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "entityId": { "type": "integer", "description": "ID of the entity to follow" },
                "distance": {
                    "type": "number",
                    "default": self.default_distance,
                    "description": "Distance to maintain while following"
                }
            },
            "required": ["entityId"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: FollowArgs = parse_args(self.name(), arguments)?;
        let distance = args.distance.unwrap_or(self.default_distance);
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };
        let Some(entity) = client.entity(args.entity_id) else {
            return Ok(not_found(args.entity_id));
        };

        Ok(match client.follow(entity.id, distance) {
            Ok(()) => ToolOutcome::ok(format!(
                "Following entity: {} (ID: {}) with distance of {distance} blocks",
                entity_name(&entity),
                entity.id
            )),
            Err(e) => e.into(),
        })
    }
}
