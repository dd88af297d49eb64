//! Inventory tools: `checkInventory`, `inventoryDetails`, `equipItem`,
//! `tossItem`.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{EquipDestination, GameClient, Item, Session, ToolOutcome};
use serde::Deserialize;

fn default_amount() -> u32 {
    1
}

/// First inventory stack whose internal name matches, ignoring case.
pub(crate) fn find_item(client: &dyn GameClient, name: &str) -> Option<Item> {
    client.inventory_items().into_iter().find(|i| i.is_named(name))
}

fn not_in_inventory(name: &str) -> ToolOutcome {
    ToolOutcome::domain(format!("Item \"{name}\" not found in inventory."))
}

pub struct CheckInventoryTool {
    session: Arc<Session>,
}

impl CheckInventoryTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for CheckInventoryTool {
    fn name(&self) -> &str {
        "checkInventory"
    }

    fn description(&self) -> &str {
        "Check the items in the player inventory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let items = client.inventory_items();
        if items.is_empty() {
            return Ok(ToolOutcome::domain("Inventory is empty."));
        }

        let list = items
            .iter()
            .map(|i| format!("{} x{}", i.name, i.count))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ToolOutcome::ok(format!("Inventory contains: {list}")))
    }
}

/// Held item, armor slots, and every stack with durability and enchantments.
pub struct InventoryDetailsTool {
    session: Arc<Session>,
}

impl InventoryDetailsTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for InventoryDetailsTool {
    fn name(&self) -> &str {
        "inventoryDetails"
    }

    fn description(&self) -> &str {
        "Get detailed information about inventory items"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let items = client.inventory_items();
        if items.is_empty() {
            return Ok(ToolOutcome::domain("Inventory is empty."));
        }
        let equipment = client.equipment();
        let label = |slot: &Option<Item>| slot.as_ref().map_or("None", |i| i.label()).to_string();

        let mut out = String::from("Inventory Contents:\n\n");
        match &equipment.held {
            Some(held) => {
                let _ = writeln!(out, "Held Item: {} (x{})", held.label(), held.count);
            }
            None => out.push_str("Held Item: None\n"),
        }

        out.push_str("\nEquipped Armor:\n");
        let _ = writeln!(out, "Helmet: {}", label(&equipment.head));
        let _ = writeln!(out, "Chestplate: {}", label(&equipment.torso));
        let _ = writeln!(out, "Leggings: {}", label(&equipment.legs));
        let _ = writeln!(out, "Boots: {}", label(&equipment.feet));

        out.push_str("\nAll Items:\n");
        for (i, item) in items.iter().enumerate() {
            let _ = write!(out, "{}. {} (x{})", i + 1, item.label(), item.count);
            if let Some(max) = item.max_durability {
                let _ = write!(out, " - Durability: {}/{max}", item.durability_used);
            }
            if !item.enchantments.is_empty() {
                let _ = write!(out, " - Enchantments: {}", item.enchantments.join(", "));
            }
            out.push('\n');
        }

        Ok(ToolOutcome::ok(out))
    }
}

pub struct EquipItemTool {
    session: Arc<Session>,
}

impl EquipItemTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquipArgs {
    item_name: String,
    #[serde(default)]
    destination: EquipDestination,
}

#[async_trait]
impl Tool for EquipItemTool {
    fn name(&self) -> &str {
        "equipItem"
    }

    fn description(&self) -> &str {
        "Equip an item from inventory to hand or armor slot"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "itemName": { "type": "string", "description": "Name of the item to equip" },
                "destination": {
                    "type": "string",
                    "enum": ["hand", "head", "torso", "legs", "feet"],
                    "default": "hand",
                    "description": "Slot to equip the item to"
                }
            },
            "required": ["itemName"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: EquipArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some(item) = find_item(client.as_ref(), &args.item_name) else {
            return Ok(not_in_inventory(&args.item_name));
        };

        Ok(match client.equip(&item, args.destination).await {
            Ok(()) => ToolOutcome::ok(format!(
                "Successfully equipped {} to {}",
                args.item_name, args.destination
            )),
            Err(e) => e.into(),
        })
    }
}

pub struct TossItemTool {
    session: Arc<Session>,
}

impl TossItemTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TossArgs {
    item_name: String,
    #[serde(default = "default_amount")]
    amount: u32,
}

#[async_trait]
impl Tool for TossItemTool {
    fn name(&self) -> &str {
        "tossItem"
    }

    fn description(&self) -> &str {
        "Throw items from inventory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "itemName": { "type": "string", "description": "Name of the item to throw" },
                "amount": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 1,
                    "description": "Amount of items to throw"
                }
            },
            "required": ["itemName"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: TossArgs = parse_args(self.name(), arguments)?;
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some(item) = find_item(client.as_ref(), &args.item_name) else {
            return Ok(not_in_inventory(&args.item_name));
        };

        Ok(match client.toss(item.item_type, args.amount).await {
            Ok(()) => ToolOutcome::ok(format!(
                "Successfully threw {} {}",
                args.amount, args.item_name
            )),
            Err(e) => e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_gated, connected, run};
    use mcremote_sim::{SimCall, SimWorld, item};
    use serde_json::json;

    #[tokio::test]
    async fn empty_inventory() {
        let world = SimWorld::new();
        let session = connected(&world).await;
        let check = CheckInventoryTool::new(session.clone());
        let details = InventoryDetailsTool::new(session);
        assert_eq!(run(&check, json!({})).await, ToolOutcome::domain("Inventory is empty."));
        assert_eq!(run(&details, json!({})).await, ToolOutcome::domain("Inventory is empty."));
    }

    #[tokio::test]
    async fn lists_stacks_by_internal_name() {
        let world = SimWorld::new();
        world.give(item("oak_planks", 32));
        world.give(item("stick", 8));
        let tool = CheckInventoryTool::new(connected(&world).await);
        assert_eq!(
            run(&tool, json!({})).await,
            ToolOutcome::ok("Inventory contains: oak_planks x32, stick x8")
        );
    }

    #[tokio::test]
    async fn details_show_held_armor_and_wear() {
        let world = SimWorld::new();
        world.give(Item {
            max_durability: Some(250),
            durability_used: 12,
            enchantments: vec!["efficiency".into(), "unbreaking".into()],
            ..item("iron_pickaxe", 1)
        });
        world.give(item("iron_helmet", 1));
        world.give(item("bread", 3));
        let session = connected(&world).await;
        let equip = EquipItemTool::new(session.clone());
        run(&equip, json!({"itemName": "iron_pickaxe"})).await;
        run(&equip, json!({"itemName": "iron_helmet", "destination": "head"})).await;

        let text = run(&InventoryDetailsTool::new(session), json!({})).await.text();
        assert!(text.starts_with("Inventory Contents:\n\nHeld Item: Iron Pickaxe (x1)\n"));
        assert!(text.contains("\nEquipped Armor:\nHelmet: Iron Helmet\nChestplate: None\n"));
        assert!(text.contains(
            "1. Iron Pickaxe (x1) - Durability: 12/250 - Enchantments: efficiency, unbreaking\n"
        ));
        assert!(text.contains("3. Bread (x3)\n"));
    }

    #[tokio::test]
    async fn equip_defaults_to_hand() {
        let world = SimWorld::new();
        world.give(item("stone_sword", 1));
        let tool = EquipItemTool::new(connected(&world).await);
        let outcome = run(&tool, json!({"itemName": "STONE_SWORD"})).await;
        assert_eq!(outcome, ToolOutcome::ok("Successfully equipped STONE_SWORD to hand"));
        assert!(world.calls().contains(&SimCall::Equip {
            item: "stone_sword".into(),
            destination: EquipDestination::Hand
        }));
    }

    #[tokio::test]
    async fn equip_missing_item() {
        let world = SimWorld::new();
        let tool = EquipItemTool::new(connected(&world).await);
        let outcome = run(&tool, json!({"itemName": "diamond_sword"})).await;
        assert_eq!(
            outcome,
            ToolOutcome::domain("Item \"diamond_sword\" not found in inventory.")
        );
    }

    #[tokio::test]
    async fn toss_removes_items() {
        let world = SimWorld::new();
        world.give(item("dirt", 10));
        let tool = TossItemTool::new(connected(&world).await);
        let outcome = run(&tool, json!({"itemName": "dirt", "amount": 4})).await;
        assert_eq!(outcome, ToolOutcome::ok("Successfully threw 4 dirt"));
        assert_eq!(world.inventory_count("dirt"), 6);
    }

    #[tokio::test]
    async fn tossing_more_than_held_fails() {
        let world = SimWorld::new();
        world.give(item("dirt", 2));
        let tool = TossItemTool::new(connected(&world).await);
        let outcome = run(&tool, json!({"itemName": "dirt", "amount": 5})).await;
        assert!(matches!(outcome, ToolOutcome::Failed(_)));
        assert_eq!(world.inventory_count("dirt"), 2);
    }

    #[tokio::test]
    async fn gated_when_disconnected() {
        assert_gated(|s| Box::new(CheckInventoryTool::new(s)), json!({})).await;
        assert_gated(|s| Box::new(InventoryDetailsTool::new(s)), json!({})).await;
        assert_gated(|s| Box::new(EquipItemTool::new(s)), json!({"itemName": "stick"})).await;
        assert_gated(|s| Box::new(TossItemTool::new(s)), json!({"itemName": "stick"})).await;
    }
}
