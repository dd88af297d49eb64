//! Remote-control action groups for mcremote.
//!
//! Each group gives the orchestrator one slice of control over the bot:
//! connection lifecycle, chat, movement, looking and basic controls, block
//! digging and placement, inventory, containers, entities, crafting,
//! villager trading, and server info. Every tool is a [`Tool`] impl that
//! validates its arguments, checks the shared [`Session`], and issues calls
//! against the live game client.

pub mod blocks;
pub mod chat;
pub mod connection;
pub mod containers;
pub mod controls;
pub mod crafting;
pub mod entities;
pub mod info;
pub mod inventory;
pub mod movement;
pub mod trading;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use mcremote_config::AppConfig;
use mcremote_core::tool::{Tool, ToolRegistry};
use mcremote_core::{GameConnector, Session};

/// Create the tool registry with every action group registered once.
pub fn default_registry(
    session: Arc<Session>,
    connector: Arc<dyn GameConnector>,
    config: &AppConfig,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for tool in all_tools(session, connector, config) {
        registry.register(tool);
    }
    registry
}

fn all_tools(
    session: Arc<Session>,
    connector: Arc<dyn GameConnector>,
    config: &AppConfig,
) -> Vec<Box<dyn Tool>> {
    let s = &session;
    vec![
        // Connection
        Box::new(connection::ConnectTool::new(
            s.clone(),
            connector,
            config.connection.default_port,
            config.connect_timeout(),
        )),
        Box::new(connection::DisconnectTool::new(s.clone())),
        // Chat
        Box::new(chat::SendChatTool::new(s.clone())),
        // Movement
        Box::new(movement::GetPositionTool::new(s.clone())),
        Box::new(movement::MoveToTool::new(s.clone(), config.move_timeout())),
        // Look and basic controls
        Box::new(controls::MoveControlTool::new(s.clone())),
        Box::new(controls::LookAtTool::new(s.clone())),
        // Blocks
        Box::new(blocks::DigBlockTool::new(s.clone(), config.dig_timeout())),
        Box::new(blocks::PlaceBlockTool::new(s.clone())),
        // Inventory
        Box::new(inventory::CheckInventoryTool::new(s.clone())),
        Box::new(inventory::InventoryDetailsTool::new(s.clone())),
        Box::new(inventory::EquipItemTool::new(s.clone())),
        Box::new(inventory::TossItemTool::new(s.clone())),
        // Containers
        Box::new(containers::OpenContainerTool::new(s.clone())),
        Box::new(containers::WithdrawItemTool::new(s.clone())),
        Box::new(containers::DepositItemTool::new(s.clone())),
        Box::new(containers::CloseContainerTool::new(s.clone())),
        // Entities
        Box::new(entities::NearbyEntitiesTool::new(
            s.clone(),
            config.search.entity_range,
        )),
        Box::new(entities::AttackEntityTool::new(s.clone())),
        Box::new(entities::UseOnEntityTool::new(s.clone())),
        Box::new(entities::FollowEntityTool::new(
            s.clone(),
            config.search.follow_distance,
        )),
        // Crafting
        Box::new(crafting::GetRecipesTool::new(s.clone())),
        Box::new(crafting::CraftItemTool::new(s.clone())),
        // Trading
        Box::new(trading::ListTradesTool::new(
            s.clone(),
            config.search.villager_range,
        )),
        Box::new(trading::TradeWithVillagerTool::new(
            s.clone(),
            config.search.villager_range,
        )),
        // Info
        Box::new(info::NearbyPlayersTool::new(s.clone())),
        Box::new(info::ServerInfoTool::new(session)),
    ]
}

/// Arguments of every tool addressed by world coordinates.
#[derive(serde::Deserialize)]
pub(crate) struct XyzArgs {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Format a coordinate the way it was supplied: `10` stays `10`, `10.5`
/// stays `10.5`.
pub(crate) fn coords(x: f64, y: f64, z: f64) -> String {
    format!("X={x}, Y={y}, Z={z}")
}

/// Schema fragment for an `{x, y, z}` argument object.
pub(crate) fn xyz_schema(what: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "x": { "type": "number", "description": format!("X coordinate{what}") },
            "y": { "type": "number", "description": format!("Y coordinate{what}") },
            "z": { "type": "number", "description": format!("Z coordinate{what}") }
        },
        "required": ["x", "y", "z"]
    })
}
