//! Simulated game client and its windows.
//!
//! World state lives behind a std mutex that is never held across an
//! `.await`; timed actions (pathfinding, digging) sleep on the tokio clock so
//! tests can drive them with paused time.

use std::sync::MutexGuard;

use async_trait::async_trait;
use mcremote_core::{
    Block, BlockPos, ContainerWindow, ControlState, Entity, EquipDestination, Equipment, Face,
    GameClient, GameError, GameInfo, Item, PlayerInfo, Recipe, TradeWindow, Vec3, WindowId,
};

use crate::world::{SimCall, SimOp, SimWorld, WindowKind, WorldState, item};

/// A client connected to a [`SimWorld`].
pub struct SimClient {
    world: SimWorld,
}

impl SimClient {
    pub fn new(world: SimWorld) -> Self {
        Self { world }
    }

    /// Record a call and fail it if the world is offline or `op` is rigged.
    fn begin(&self, call: SimCall, op: SimOp) -> Result<MutexGuard<'_, WorldState>, GameError> {
        let mut state = self.world.state();
        state.record(call);
        if !state.online {
            return Err(GameError::Disconnected("client has quit".into()));
        }
        match state.failure(op) {
            Some(message) => Err(GameError::Rejected(message)),
            None => Ok(state),
        }
    }

    fn require_entity(state: &WorldState, id: i32) -> Result<(), GameError> {
        if state.entities.iter().any(|e| e.id == id) {
            Ok(())
        } else {
            Err(GameError::NotFound(format!("entity {id}")))
        }
    }
}

#[async_trait]
impl GameClient for SimClient {
    fn username(&self) -> String {
        self.world.state().username.clone()
    }

    fn entity_id(&self) -> i32 {
        self.world.state().self_id
    }

    fn position(&self) -> Vec3 {
        self.world.state().position
    }

    fn block_at(&self, pos: BlockPos) -> Option<Block> {
        self.world
            .state()
            .block_name(pos)
            .map(|name| Block { name, position: pos })
    }

    fn inventory_items(&self) -> Vec<Item> {
        self.world.state().inventory.clone()
    }

    fn equipment(&self) -> Equipment {
        self.world.state().equipment.clone()
    }

    fn entities(&self) -> Vec<Entity> {
        let state = self.world.state();
        std::iter::once(state.self_entity())
            .chain(state.entities.iter().cloned())
            .collect()
    }

    fn entity(&self, id: i32) -> Option<Entity> {
        let state = self.world.state();
        if id == state.self_id {
            return Some(state.self_entity());
        }
        state.entities.iter().find(|e| e.id == id).cloned()
    }

    fn players(&self) -> Vec<PlayerInfo> {
        let state = self.world.state();
        std::iter::once(PlayerInfo {
            username: state.username.clone(),
            position: Some(state.position),
        })
        .chain(state.other_players.iter().map(|(username, position)| PlayerInfo {
            username: username.clone(),
            position: *position,
        }))
        .collect()
    }

    fn game_info(&self) -> GameInfo {
        let state = self.world.state();
        GameInfo {
            version: state.version.clone(),
            game_mode: state.game_mode.clone(),
            difficulty: state.difficulty.clone(),
            time_of_day: state.time_of_day,
            players_online: 1 + state.other_players.len(),
            health: Some(state.health),
            food: Some(state.food),
        }
    }

    fn current_window(&self) -> Option<WindowId> {
        self.world.state().window.map(|w| w.id)
    }

    fn load_pathfinder(&self) -> Result<(), GameError> {
        let mut state = self.begin(SimCall::LoadPathfinder, SimOp::LoadPathfinder)?;
        state.pathfinder_loaded = true;
        Ok(())
    }

    fn chat(&self, message: &str) -> Result<(), GameError> {
        let mut state = self.begin(SimCall::Chat(message.to_string()), SimOp::Chat)?;
        state.chat_log.push(message.to_string());
        Ok(())
    }

    fn set_control_state(&self, control: ControlState, active: bool) {
        let mut state = self.world.state();
        state.record(SimCall::SetControl(control, active));
        if active {
            state.controls.insert(control);
        } else {
            state.controls.remove(&control);
        }
    }

    fn clear_control_states(&self) {
        let mut state = self.world.state();
        state.record(SimCall::ClearControls);
        state.controls.clear();
    }

    async fn look_at(&self, target: Vec3) -> Result<(), GameError> {
        self.begin(SimCall::LookAt(target), SimOp::LookAt)?;
        Ok(())
    }

    async fn goto(&self, goal: BlockPos) -> Result<(), GameError> {
        let delay = {
            let state = self.begin(SimCall::Goto(goal), SimOp::Goto)?;
            if !state.pathfinder_loaded {
                return Err(GameError::Other("pathfinder is not loaded".into()));
            }
            state.goto_delay
        };
        tokio::time::sleep(delay).await;
        self.world.state().position = goal.center();
        Ok(())
    }

    fn follow(&self, entity_id: i32, distance: f64) -> Result<(), GameError> {
        let state = self.begin(SimCall::Follow { entity_id, distance }, SimOp::Follow)?;
        Self::require_entity(&state, entity_id)
    }

    fn stop_pathing(&self) {
        self.world.state().record(SimCall::StopPathing);
    }

    async fn dig(&self, block: &Block) -> Result<(), GameError> {
        let delay = {
            let state = self.begin(SimCall::Dig(block.position), SimOp::Dig)?;
            if state.block_name(block.position).as_deref() != Some(block.name.as_str()) {
                return Err(GameError::Rejected(format!(
                    "Block at {} changed before digging started",
                    block.position
                )));
            }
            state.dig_delay
        };
        tokio::time::sleep(delay).await;
        let mut state = self.world.state();
        state.blocks.remove(&block.position);
        state.add_to_inventory(&item(&block.name, 1), 1);
        Ok(())
    }

    fn stop_digging(&self) {
        self.world.state().record(SimCall::StopDigging);
    }

    async fn place_block(&self, reference: &Block, face: Face) -> Result<(), GameError> {
        let mut state = self.begin(
            SimCall::Place {
                reference: reference.position,
                face,
            },
            SimOp::Place,
        )?;
        if state.failing_faces.contains(&face) {
            return Err(GameError::Rejected(format!(
                "No block has been placed: {face:?} face of {} is obstructed",
                reference.position
            )));
        }
        let target = reference.position.offset(face);
        if state.block_name(target).as_deref() != Some("air") {
            return Err(GameError::Rejected(format!("Target {target} is occupied")));
        }
        let held = state
            .equipment
            .held
            .clone()
            .ok_or_else(|| GameError::Rejected("Nothing held to place".into()))?;
        state
            .take_from_inventory(held.item_type, 1)
            .map_err(GameError::Rejected)?;
        state.blocks.insert(target, held.name);
        Ok(())
    }

    async fn equip(&self, item: &Item, destination: EquipDestination) -> Result<(), GameError> {
        let mut state = self.begin(
            SimCall::Equip {
                item: item.name.clone(),
                destination,
            },
            SimOp::Equip,
        )?;
        let stack = state
            .inventory
            .iter()
            .find(|i| i.slot == item.slot && i.item_type == item.item_type)
            .cloned()
            .ok_or_else(|| GameError::NotFound(format!("{} in slot {}", item.name, item.slot)))?;
        let slot = match destination {
            EquipDestination::Hand => &mut state.equipment.held,
            EquipDestination::Head => &mut state.equipment.head,
            EquipDestination::Torso => &mut state.equipment.torso,
            EquipDestination::Legs => &mut state.equipment.legs,
            EquipDestination::Feet => &mut state.equipment.feet,
        };
        *slot = Some(stack);
        Ok(())
    }

    async fn toss(&self, item_type: u32, count: u32) -> Result<(), GameError> {
        let mut state = self.begin(SimCall::Toss { item_type, count }, SimOp::Toss)?;
        state
            .take_from_inventory(item_type, count)
            .map(|_| ())
            .map_err(GameError::Rejected)
    }

    async fn attack(&self, entity: &Entity) -> Result<(), GameError> {
        let state = self.begin(SimCall::Attack(entity.id), SimOp::Attack)?;
        Self::require_entity(&state, entity.id)
    }

    async fn use_on(&self, entity: &Entity) -> Result<(), GameError> {
        let state = self.begin(SimCall::UseOn(entity.id), SimOp::UseOn)?;
        Self::require_entity(&state, entity.id)
    }

    fn recipes(&self) -> Vec<Recipe> {
        let state = self.world.state();
        state
            .recipes
            .iter()
            .filter(|r| {
                r.ingredients
                    .iter()
                    .all(|ing| state.inventory_count(&ing.name) >= ing.count)
            })
            .cloned()
            .collect()
    }

    async fn craft(&self, recipe: &Recipe, count: u32) -> Result<(), GameError> {
        let mut state = self.begin(
            SimCall::Craft {
                result: recipe.result.clone(),
                count,
            },
            SimOp::Craft,
        )?;
        for ing in &recipe.ingredients {
            let needed = ing.count * count;
            if state.inventory_count(&ing.name) < needed {
                return Err(GameError::Rejected(format!(
                    "Missing ingredients: need {needed} {}",
                    ing.name
                )));
            }
        }
        for ing in &recipe.ingredients {
            let item_type = state
                .inventory
                .iter()
                .find(|i| i.is_named(&ing.name))
                .map(|i| i.item_type)
                .ok_or_else(|| GameError::NotFound(ing.name.clone()))?;
            state
                .take_from_inventory(item_type, ing.count * count)
                .map_err(GameError::Rejected)?;
        }
        state.add_to_inventory(&item(&recipe.result, 1), recipe.result_count * count);
        Ok(())
    }

    async fn open_container(&self, block: &Block) -> Result<Box<dyn ContainerWindow>, GameError> {
        let mut state = self.begin(SimCall::OpenContainer(block.position), SimOp::OpenContainer)?;
        if !state.containers.contains_key(&block.position) {
            return Err(GameError::Rejected(format!(
                "Block at {} is not a container",
                block.position
            )));
        }
        let id = state.open_window(WindowKind::Container(block.position));
        Ok(Box::new(SimContainerWindow {
            world: self.world.clone(),
            id,
            pos: block.position,
        }))
    }

    async fn open_villager(&self, villager: &Entity) -> Result<Box<dyn TradeWindow>, GameError> {
        let mut state = self.begin(SimCall::OpenVillager(villager.id), SimOp::OpenVillager)?;
        if !state.villager_trades.contains_key(&villager.id) {
            return Err(GameError::Rejected(format!(
                "Entity {} does not trade",
                villager.id
            )));
        }
        let id = state.open_window(WindowKind::Villager(villager.id));
        Ok(Box::new(SimTradeWindow {
            world: self.world.clone(),
            id,
            villager: villager.id,
        }))
    }

    async fn close_window(&self, window: WindowId) -> Result<(), GameError> {
        let mut state = self.begin(SimCall::CloseWindow(window), SimOp::CloseWindow)?;
        if state.is_window_open(window) {
            state.window = None;
        }
        Ok(())
    }

    fn quit(&self) -> Result<(), GameError> {
        let mut state = self.world.state();
        state.record(SimCall::Quit);
        if let Some(message) = state.failure(SimOp::Quit) {
            return Err(GameError::Other(message));
        }
        state.online = false;
        state.window = None;
        state.controls.clear();
        Ok(())
    }
}

/// An open chest-like window in the simulated world.
pub struct SimContainerWindow {
    world: SimWorld,
    id: WindowId,
    pos: BlockPos,
}

impl SimContainerWindow {
    fn begin(&self, call: SimCall, op: SimOp) -> Result<MutexGuard<'_, WorldState>, GameError> {
        let mut state = self.world.state();
        state.record(call);
        if let Some(message) = state.failure(op) {
            return Err(GameError::Rejected(message));
        }
        if !state.is_window_open(self.id) {
            return Err(GameError::WindowClosed(format!("container window {}", self.id)));
        }
        Ok(state)
    }
}

#[async_trait]
impl ContainerWindow for SimContainerWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn slots(&self) -> Vec<Option<Item>> {
        self.world
            .state()
            .containers
            .get(&self.pos)
            .map(|c| c.slots.clone())
            .unwrap_or_default()
    }

    async fn withdraw(&self, item_type: u32, count: u32) -> Result<(), GameError> {
        let mut state = self.begin(SimCall::Withdraw { item_type, count }, SimOp::Withdraw)?;
        let template = {
            let container = state
                .containers
                .get_mut(&self.pos)
                .ok_or_else(|| GameError::WindowClosed(format!("container at {}", self.pos)))?;
            let available: u32 = container
                .slots
                .iter()
                .flatten()
                .filter(|s| s.item_type == item_type)
                .map(|s| s.count)
                .sum();
            let template = container
                .slots
                .iter()
                .flatten()
                .find(|s| s.item_type == item_type)
                .cloned();
            let template = match template {
                Some(t) if available >= count => t,
                _ => {
                    return Err(GameError::Rejected(format!(
                        "Can't find {count} items of type {item_type} in the container"
                    )));
                }
            };

            let mut remaining = count;
            for slot in container.slots.iter_mut() {
                if remaining == 0 {
                    break;
                }
                let mut emptied = false;
                if let Some(stack) = slot.as_mut() {
                    if stack.item_type != item_type {
                        continue;
                    }
                    let taken = remaining.min(stack.count);
                    stack.count -= taken;
                    remaining -= taken;
                    emptied = stack.count == 0;
                }
                if emptied {
                    *slot = None;
                }
            }
            template
        };
        state.add_to_inventory(&template, count);
        Ok(())
    }

    async fn deposit(&self, item_type: u32, count: u32) -> Result<(), GameError> {
        let mut state = self.begin(SimCall::Deposit { item_type, count }, SimOp::Deposit)?;
        let has_room = state.containers.get(&self.pos).is_some_and(|c| {
            c.slots
                .iter()
                .any(|s| s.as_ref().is_none_or(|stack| stack.item_type == item_type))
        });
        if !has_room {
            return Err(GameError::Rejected("Container is full".into()));
        }
        let template = state
            .take_from_inventory(item_type, count)
            .map_err(GameError::Rejected)?;

        let container = state
            .containers
            .get_mut(&self.pos)
            .ok_or_else(|| GameError::WindowClosed(format!("container at {}", self.pos)))?;
        if let Some(stack) = container
            .slots
            .iter_mut()
            .flatten()
            .find(|s| s.item_type == item_type)
        {
            stack.count += count;
        } else if let Some((index, slot)) = container
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| s.is_none())
        {
            *slot = Some(Item {
                count,
                slot: index,
                ..template
            });
        }
        Ok(())
    }
}

/// An open villager trading window in the simulated world.
pub struct SimTradeWindow {
    world: SimWorld,
    id: WindowId,
    villager: i32,
}

#[async_trait]
impl TradeWindow for SimTradeWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn slots(&self) -> Vec<Option<Item>> {
        self.world
            .state()
            .villager_trades
            .get(&self.villager)
            .cloned()
            .unwrap_or_default()
    }

    async fn trade(&self, index: usize, count: u32) -> Result<(), GameError> {
        let mut state = self.world.state();
        state.record(SimCall::Trade { index, count });
        if let Some(message) = state.failure(SimOp::Trade) {
            return Err(GameError::Rejected(message));
        }
        if !state.is_window_open(self.id) {
            return Err(GameError::WindowClosed(format!("trade window {}", self.id)));
        }
        let offer = state
            .villager_trades
            .get(&self.villager)
            .and_then(|trades| trades.get(index).cloned().flatten())
            .ok_or_else(|| GameError::Rejected(format!("Villager has no trade at index {index}")))?;
        state.add_to_inventory(&offer, offer.count * count);
        Ok(())
    }
}
