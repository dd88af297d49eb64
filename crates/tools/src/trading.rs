//! Villager trading tools: `listTrades`, `tradeWithVillager`.
//!
//! Both pick the nearest villager within range, optionally narrowed by a
//! case-insensitive substring of its name. A tracked container is closed
//! before the trading window replaces it. Whatever happens once the trading
//! window is open, it is closed again before the tool returns.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{Entity, GameClient, Item, Session, ToolOutcome, TradeWindow};
use serde::Deserialize;
use tracing::{info, warn};

use crate::containers::close_if_current;

/// The nearest villager within `range`, with its distance. Ties go to the
/// first one seen.
fn find_villager(client: &dyn GameClient, name: Option<&str>, range: f64) -> Option<(Entity, f64)> {
    let me = client.position();
    let needle = name.map(str::to_lowercase);
    let mut nearest: Option<(Entity, f64)> = None;

    for entity in client.entities() {
        if entity.kind != "villager" {
            continue;
        }
        let distance = me.distance_to(&entity.position);
        if distance > range {
            continue;
        }
        if let Some(needle) = &needle {
            let matches = entity
                .name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(needle.as_str()));
            if !matches {
                continue;
            }
        }
        if nearest.as_ref().is_none_or(|(_, best)| distance < *best) {
            nearest = Some((entity, distance));
        }
    }
    nearest
}

fn no_villager(name: Option<&str>) -> ToolOutcome {
    ToolOutcome::domain(match name {
        Some(n) => format!("No villager named \"{n}\" found nearby."),
        None => "No villagers found nearby.".to_string(),
    })
}

fn villager_label(villager: &Entity) -> &str {
    villager.name.as_deref().unwrap_or("Unknown")
}

/// Drop the tracked container; the server is about to switch windows.
async fn release_container(session: &Session, client: &dyn GameClient) {
    let mut state = session.lock().await;
    if let Err(e) = close_if_current(client, &mut state).await {
        warn!(error = %e, "Failed to close the open container before trading");
    }
}

/// Close the trading window if the server still has it open.
async fn close_trade(client: &dyn GameClient, window: &dyn TradeWindow) {
    if client.current_window() != Some(window.id()) {
        return;
    }
    if let Err(e) = client.close_window(window.id()).await {
        warn!(window = %window.id(), error = %e, "Failed to close trading window");
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTradesArgs {
    villager_name: Option<String>,
    range: Option<f64>,
}

pub struct ListTradesTool {
    session: Arc<Session>,
    default_range: f64,
}

impl ListTradesTool {
    pub fn new(session: Arc<Session>, default_range: f64) -> Self {
        Self {
            session,
            default_range,
        }
    }
}

#[async_trait]
impl Tool for ListTradesTool {
    fn name(&self) -> &str {
        "listTrades"
    }

    fn description(&self) -> &str {
        "List available trades from a nearby villager"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "villagerName": {
                    "type": "string",
                    "description": "Name or identifier of the villager (optional)"
                },
                "range": {
                    "type": "number",
                    "default": self.default_range,
                    "description": "Range to search for villagers"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: ListTradesArgs = parse_args(self.name(), arguments)?;
        let name = args.villager_name.as_deref().filter(|n| !n.is_empty());
        let range = args.range.unwrap_or(self.default_range);
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };

        let Some((villager, distance)) = find_villager(client.as_ref(), name, range) else {
            return Ok(no_villager(name));
        };

        release_container(&self.session, client.as_ref()).await;
        let window = match client.open_villager(&villager).await {
            Ok(window) => window,
            Err(e) => return Ok(e.into()),
        };
        let trades: Vec<Item> = window.slots().into_iter().flatten().collect();
        close_trade(client.as_ref(), window.as_ref()).await;

        if trades.is_empty() {
            return Ok(ToolOutcome::domain("Villager found, but no trades are available."));
        }

        let mut out = format!(
            "Available trades from villager {} ({distance:.1} blocks away):\n\n",
            villager_label(&villager)
        );
        for (i, trade) in trades.iter().enumerate() {
            let _ = writeln!(out, "{}. {} (x{})", i + 1, trade.label(), trade.count.max(1));
        }
        Ok(ToolOutcome::ok(out))
    }
}

fn default_count() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeArgs {
    villager_name: Option<String>,
    trade_index: usize,
    #[serde(default = "default_count")]
    count: u32,
}

pub struct TradeWithVillagerTool {
    session: Arc<Session>,
    range: f64,
}

impl TradeWithVillagerTool {
    pub fn new(session: Arc<Session>, range: f64) -> Self {
        Self { session, range }
    }
}

#[async_trait]
impl Tool for TradeWithVillagerTool {
    fn name(&self) -> &str {
        "tradeWithVillager"
    }

    fn description(&self) -> &str {
        "Trade with a nearby villager"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "villagerName": {
                    "type": "string",
                    "description": "Name or identifier of the villager (optional)"
                },
                "tradeIndex": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Index of the trade from listTrades (1-based)"
                },
                "count": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 1,
                    "description": "Number of times to perform the trade"
                }
            },
            "required": ["tradeIndex"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: TradeArgs = parse_args(self.name(), arguments)?;
        let name = args.villager_name.as_deref().filter(|n| !n.is_empty());
        let Some(client) = self.session.client().await else {
            return Ok(ToolOutcome::NotConnected);
        };
        if args.trade_index == 0 {
            return Err(ToolError::InvalidArguments {
                tool_name: self.name().to_string(),
                reason: "tradeIndex is 1-based and must be at least 1".into(),
            });
        }

        let Some((villager, _)) = find_villager(client.as_ref(), name, self.range) else {
            return Ok(no_villager(name));
        };

        release_container(&self.session, client.as_ref()).await;
        let window = match client.open_villager(&villager).await {
            Ok(window) => window,
            Err(e) => return Ok(e.into()),
        };
        let traded = window.trade(args.trade_index - 1, args.count).await;
        close_trade(client.as_ref(), window.as_ref()).await;

        if let Err(e) = traded {
            return Ok(e.into());
        }
        info!(villager = villager.id, trade = args.trade_index, count = args.count, "Traded");
        Ok(ToolOutcome::ok(format!(
            "Successfully traded with villager {}, trade #{} (x{})",
            villager_label(&villager),
            args.trade_index,
            args.count
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcremote_core::{BlockPos, Vec3};
    use mcremote_sim::{SimCall, SimOp, SimWorld, item};
    use serde_json::json;

    use crate::containers::OpenContainerTool;
    use crate::testing::{assert_gated, connected, run};

    fn village() -> SimWorld {
        let world = SimWorld::new();
        world.set_position(Vec3::new(0.0, 64.0, 0.0));
        world.add_villager(
            7,
            "farmer",
            Vec3::new(3.0, 64.0, 0.0),
            vec![Some(item("emerald", 1)), None, Some(item("bread", 6))],
        );
        world.add_villager(
            8,
            "librarian",
            Vec3::new(0.0, 64.0, 2.0),
            vec![Some(item("enchanted_book", 1))],
        );
        world
    }

    fn open_calls(world: &SimWorld) -> Vec<SimCall> {
        world.calls_matching(|c| matches!(c, SimCall::OpenVillager(_)))
    }

    #[tokio::test]
    async fn lists_trades_of_the_nearest_villager() {
        let world = village();
        let tool = ListTradesTool::new(connected(&world).await, 4.0);

        let outcome = run(&tool, json!({})).await;
        assert_eq!(
            outcome,
            ToolOutcome::ok(
                "Available trades from villager librarian (2.0 blocks away):\n\n\
                 1. Enchanted Book (x1)\n"
            )
        );
        assert_eq!(open_calls(&world), vec![SimCall::OpenVillager(8)]);
        assert_eq!(world.current_window(), None);
    }

    #[tokio::test]
    async fn name_filter_is_a_case_insensitive_substring() {
        let world = village();
        let tool = ListTradesTool::new(connected(&world).await, 4.0);

        let outcome = run(&tool, json!({"villagerName": "FARM"})).await;
        assert_eq!(
            outcome,
            ToolOutcome::ok(
                "Available trades from villager farmer (3.0 blocks away):\n\n\
                 1. Emerald (x1)\n\
                 2. Bread (x6)\n"
            )
        );
    }

    #[tokio::test]
    async fn equal_distance_goes_to_the_first_seen() {
        let world = SimWorld::new();
        world.set_position(Vec3::new(0.0, 64.0, 0.0));
        world.add_villager(1, "first", Vec3::new(2.0, 64.0, 0.0), vec![Some(item("emerald", 1))]);
        world.add_villager(2, "second", Vec3::new(-2.0, 64.0, 0.0), vec![Some(item("emerald", 1))]);
        let tool = ListTradesTool::new(connected(&world).await, 4.0);
        run(&tool, json!({})).await;
        assert_eq!(open_calls(&world), vec![SimCall::OpenVillager(1)]);
    }

    #[tokio::test]
    async fn nobody_in_range() {
        let world = village();
        let tool = ListTradesTool::new(connected(&world).await, 4.0);
        assert_eq!(
            run(&tool, json!({"villagerName": "cleric"})).await,
            ToolOutcome::domain("No villager named \"cleric\" found nearby.")
        );
        assert_eq!(
            run(&tool, json!({"range": 1})).await,
            ToolOutcome::domain("No villagers found nearby.")
        );
        assert!(open_calls(&world).is_empty());
    }

    #[tokio::test]
    async fn villager_without_offers() {
        let world = SimWorld::new();
        world.add_villager(9, "nitwit", Vec3::new(1.5, 64.0, 0.5), vec![None, None]);
        let tool = ListTradesTool::new(connected(&world).await, 4.0);
        assert_eq!(
            run(&tool, json!({})).await,
            ToolOutcome::domain("Villager found, but no trades are available.")
        );
        assert_eq!(world.current_window(), None);
    }

    #[tokio::test]
    async fn trade_index_is_one_based() {
        let world = village();
        let tool = TradeWithVillagerTool::new(connected(&world).await, 4.0);

        let outcome = run(&tool, json!({"villagerName": "farmer", "tradeIndex": 1, "count": 3})).await;
        assert_eq!(
            outcome,
            ToolOutcome::ok("Successfully traded with villager farmer, trade #1 (x3)")
        );
        assert!(world.calls().contains(&SimCall::Trade { index: 0, count: 3 }));
        assert_eq!(world.inventory_count("emerald"), 3);
        assert_eq!(world.current_window(), None);
    }

    #[tokio::test]
    async fn trade_index_zero_is_invalid() {
        let world = village();
        let tool = TradeWithVillagerTool::new(connected(&world).await, 4.0);
        let err = tool.execute(json!({"tradeIndex": 0})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert!(open_calls(&world).is_empty());
    }

    #[tokio::test]
    async fn failed_trade_still_closes_the_window() {
        let world = village();
        world.fail(SimOp::Trade, "Not enough emeralds");
        let tool = TradeWithVillagerTool::new(connected(&world).await, 4.0);

        let outcome = run(&tool, json!({"tradeIndex": 1})).await;
        assert_eq!(outcome, ToolOutcome::Failed("Not enough emeralds".into()));
        assert_eq!(
            world.calls_matching(|c| matches!(c, SimCall::CloseWindow(_))).len(),
            1
        );
        assert_eq!(world.current_window(), None);
    }

    #[tokio::test]
    async fn failed_open_leaves_nothing_to_close() {
        let world = village();
        world.fail(SimOp::OpenVillager, "Villager is busy");
        let tool = TradeWithVillagerTool::new(connected(&world).await, 4.0);

        let outcome = run(&tool, json!({"tradeIndex": 1})).await;
        assert_eq!(outcome, ToolOutcome::Failed("Villager is busy".into()));
        assert!(world.calls_matching(|c| matches!(c, SimCall::CloseWindow(_))).is_empty());
    }

    #[tokio::test]
    async fn listing_trades_closes_the_open_container() {
        let world = village();
        world.add_container(BlockPos::new(1, 64, 0), "chest", vec![Some(item("wheat", 9))]);
        let session = connected(&world).await;
        let open = OpenContainerTool::new(session.clone());
        run(&open, json!({"x": 1, "y": 64, "z": 0})).await;
        let chest = world.current_window();
        assert!(session.lock().await.has_container());

        let tool = ListTradesTool::new(session.clone(), 4.0);
        assert!(matches!(run(&tool, json!({})).await, ToolOutcome::Ok(_)));

        assert!(!session.lock().await.has_container());
        let closes = world.calls_matching(|c| matches!(c, SimCall::CloseWindow(_)));
        assert_eq!(closes.len(), 2);
        assert_eq!(Some(closes[0].clone()), chest.map(SimCall::CloseWindow));
        assert_eq!(world.current_window(), None);
    }

    #[tokio::test]
    async fn trading_closes_the_open_container() {
        let world = village();
        world.add_container(BlockPos::new(1, 64, 0), "barrel", vec![]);
        let session = connected(&world).await;
        run(&OpenContainerTool::new(session.clone()), json!({"x": 1, "y": 64, "z": 0})).await;

        let tool = TradeWithVillagerTool::new(session.clone(), 4.0);
        let outcome = run(&tool, json!({"villagerName": "farmer", "tradeIndex": 1})).await;
        assert!(matches!(outcome, ToolOutcome::Ok(_)));
        assert!(!session.lock().await.has_container());
        assert_eq!(world.current_window(), None);
    }

    #[tokio::test]
    async fn gated_when_disconnected() {
        assert_gated(|s| Box::new(ListTradesTool::new(s, 4.0)), json!({})).await;
        assert_gated(
            |s| Box::new(TradeWithVillagerTool::new(s, 4.0)),
            json!({"tradeIndex": 1}),
        )
        .await;
        assert_gated(
            |s| Box::new(TradeWithVillagerTool::new(s, 4.0)),
            json!({"tradeIndex": 0}),
        )
        .await;
    }
}
