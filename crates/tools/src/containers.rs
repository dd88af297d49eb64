//! Container tools: `openContainer`, `withdrawItem`, `depositItem`,
//! `closeContainer`.
//!
//! The session tracks at most one open container. Opening a new one closes
//! and replaces the one already tracked. Withdraw and deposit drain matching
//! stacks in order and report how many items actually moved, which may be
//! fewer than requested.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::error::ToolError;
use mcremote_core::session::SessionState;
use mcremote_core::tool::{Tool, parse_args};
use mcremote_core::{BlockPos, GameClient, GameError, Item, Session, ToolOutcome};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{XyzArgs, coords, xyz_schema};

/// Block-name fragments that identify a container.
const CONTAINER_KINDS: &[&str] = &[
    "chest",
    "furnace",
    "barrel",
    "shulker",
    "dispenser",
    "dropper",
    "hopper",
];

const NO_CONTAINER_OPEN: &str = "No container is currently open. Use openContainer first.";

pub(crate) fn is_container(block_name: &str) -> bool {
    CONTAINER_KINDS.iter().any(|kind| block_name.contains(kind))
}

fn default_amount() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferArgs {
    item_name: String,
    #[serde(default = "default_amount")]
    amount: u32,
}

fn transfer_schema(verb: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "itemName": { "type": "string", "description": format!("Name of the item to {verb}") },
            "amount": {
                "type": "integer",
                "minimum": 1,
                "default": 1,
                "description": format!("Amount of items to {verb}")
            }
        },
        "required": ["itemName"]
    })
}

/// Close the tracked window on the client if it is still the current one.
pub(crate) async fn close_if_current(client: &dyn GameClient, state: &mut SessionState) -> Result<(), GameError> {
    let Some(window) = state.take_container() else {
        return Ok(());
    };
    if client.current_window() == Some(window.id()) {
        client.close_window(window.id()).await?;
    }
    Ok(())
}

pub struct OpenContainerTool {
    session: Arc<Session>,
}

impl OpenContainerTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for OpenContainerTool {
    fn name(&self) -> &str {
        "openContainer"
    }

    fn description(&self) -> &str {
        "Open a container (chest, furnace, etc.) at specific coordinates"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        xyz_schema(" of the container")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let XyzArgs { x, y, z } = parse_args(self.name(), arguments)?;
        let mut state = self.session.lock().await;
        let Some(client) = state.client() else {
            return Ok(ToolOutcome::NotConnected);
        };

        let at = coords(x, y, z);
        let Some(block) = client.block_at(BlockPos::containing(x, y, z)) else {
            return Ok(ToolOutcome::domain(format!("No block found at coordinates {at}")));
        };
        if !is_container(&block.name) {
            return Ok(ToolOutcome::domain(format!(
                "Block at {at} is not a container (found: {})",
                block.name
            )));
        }

        if let Err(e) = close_if_current(client.as_ref(), &mut state).await {
            warn!(error = %e, "Failed to close the previous container");
        }

        let window = match client.open_container(&block).await {
            Ok(window) => window,
            Err(e) => return Ok(e.into()),
        };
        let items: Vec<(usize, Item)> = window
            .slots()
            .into_iter()
            .enumerate()
            .filter_map(|(slot, item)| item.map(|i| (slot, i)))
            .collect();
        info!(block = %block.name, pos = %block.position, window = %window.id(), "Container opened");
        state.set_container(window);

        let mut out = format!("Opened {} at {at}\n\n", block.name);
        if items.is_empty() {
            out.push_str("Container is empty.");
        } else {
            let _ = writeln!(out, "Container contains {} items:", items.len());
            for (slot, item) in &items {
                let _ = writeln!(out, "- {} (x{}) in slot {slot}", item.label(), item.count);
            }
        }
        Ok(ToolOutcome::ok(out))
    }
}

pub struct WithdrawItemTool {
    session: Arc<Session>,
}

impl WithdrawItemTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for WithdrawItemTool {
    fn name(&self) -> &str {
        "withdrawItem"
    }

    fn description(&self) -> &str {
        "Take items from an open container"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        transfer_schema("withdraw")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: TransferArgs = parse_args(self.name(), arguments)?;
        let mut state = self.session.lock().await;
        if !state.is_connected() {
            return Ok(ToolOutcome::NotConnected);
        }
        let Some(container) = state.container() else {
            return Ok(ToolOutcome::domain(NO_CONTAINER_OPEN));
        };

        let stacks: Vec<Item> = container
            .slots()
            .into_iter()
            .flatten()
            .filter(|i| i.is_named(&args.item_name))
            .collect();
        if stacks.is_empty() {
            return Ok(ToolOutcome::domain(format!(
                "Item \"{}\" not found in the container.",
                args.item_name
            )));
        }

        let mut moved = 0;
        let mut failure = None;
        for stack in stacks {
            let n = (args.amount - moved).min(stack.count);
            if n == 0 {
                break;
            }
            if let Err(e) = container.withdraw(stack.item_type, n).await {
                failure = Some(e);
                break;
            }
            moved += n;
        }

        if let Some(e) = failure {
            return Ok(transfer_failed(&mut state, e));
        }
        Ok(ToolOutcome::ok(format!(
            "Withdrew {moved} x {} from the container.",
            args.item_name
        )))
    }
}

pub struct DepositItemTool {
    session: Arc<Session>,
}

impl DepositItemTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for DepositItemTool {
    fn name(&self) -> &str {
        "depositItem"
    }

    fn description(&self) -> &str {
        "Put items into an open container"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        transfer_schema("deposit")
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let args: TransferArgs = parse_args(self.name(), arguments)?;
        let mut state = self.session.lock().await;
        let Some(client) = state.client() else {
            return Ok(ToolOutcome::NotConnected);
        };
        let Some(container) = state.container() else {
            return Ok(ToolOutcome::domain(NO_CONTAINER_OPEN));
        };

        let stacks: Vec<Item> = client
            .inventory_items()
            .into_iter()
            .filter(|i| i.is_named(&args.item_name))
            .collect();
        if stacks.is_empty() {
            return Ok(ToolOutcome::domain(format!(
                "Item \"{}\" not found in your inventory.",
                args.item_name
            )));
        }

        let mut moved = 0;
        let mut failure = None;
        for stack in stacks {
            let n = (args.amount - moved).min(stack.count);
            if n == 0 {
                break;
            }
            if let Err(e) = container.deposit(stack.item_type, n).await {
                failure = Some(e);
                break;
            }
            moved += n;
        }

        if let Some(e) = failure {
            return Ok(transfer_failed(&mut state, e));
        }
        Ok(ToolOutcome::ok(format!(
            "Deposited {moved} x {} into the container.",
            args.item_name
        )))
    }
}

/// A window that closed underneath a transfer is no longer tracked.
fn transfer_failed(state: &mut SessionState, err: GameError) -> ToolOutcome {
    if matches!(err, GameError::WindowClosed(_)) {
        state.take_container();
        warn!(error = %err, "Container closed during transfer");
    }
    err.into()
}

pub struct CloseContainerTool {
    session: Arc<Session>,
}

impl CloseContainerTool {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for CloseContainerTool {
    fn name(&self) -> &str {
        "closeContainer"
    }

    fn description(&self) -> &str {
        "Close the currently open container"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutcome, ToolError> {
        let mut state = self.session.lock().await;
        let Some(client) = state.client() else {
            return Ok(ToolOutcome::NotConnected);
        };
        if state.take_container().is_none() {
            return Ok(ToolOutcome::domain("No container is currently open."));
        }

        if let Some(window) = client.current_window() {
            if let Err(e) = client.close_window(window).await {
                return Ok(e.into());
            }
        }
        info!("Container closed");
        Ok(ToolOutcome::ok("Container closed successfully."))
    }
}
