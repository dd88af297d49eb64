//! Shared world state, builders, and the call journal.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mcremote_core::{
    BlockPos, ConnectionEvent, ControlState, Entity, EquipDestination, Equipment, Face, Item,
    Recipe, Vec3, WindowId,
};

/// Lowest and highest buildable Y levels.
pub const MIN_Y: i32 = -64;
pub const MAX_Y: i32 = 319;

/// First inventory slot index used for stored items.
const FIRST_INVENTORY_SLOT: usize = 9;

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOp {
    Connect,
    LoadPathfinder,
    Chat,
    LookAt,
    Goto,
    Follow,
    Dig,
    Place,
    Equip,
    Toss,
    Attack,
    UseOn,
    Craft,
    OpenContainer,
    Withdraw,
    Deposit,
    OpenVillager,
    Trade,
    CloseWindow,
    Quit,
}

/// One recorded client call.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    Connect { host: String, port: u16, username: String },
    LoadPathfinder,
    Chat(String),
    SetControl(ControlState, bool),
    ClearControls,
    LookAt(Vec3),
    Goto(BlockPos),
    Follow { entity_id: i32, distance: f64 },
    StopPathing,
    Dig(BlockPos),
    StopDigging,
    Place { reference: BlockPos, face: Face },
    Equip { item: String, destination: EquipDestination },
    Toss { item_type: u32, count: u32 },
    Attack(i32),
    UseOn(i32),
    Craft { result: String, count: u32 },
    OpenContainer(BlockPos),
    Withdraw { item_type: u32, count: u32 },
    Deposit { item_type: u32, count: u32 },
    OpenVillager(i32),
    Trade { index: usize, count: u32 },
    CloseWindow(WindowId),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowKind {
    Container(BlockPos),
    Villager(i32),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenWindow {
    pub id: WindowId,
    pub kind: WindowKind,
}

pub(crate) struct ContainerState {
    pub slots: Vec<Option<Item>>,
}

pub(crate) struct WorldState {
    pub username: String,
    pub self_id: i32,
    pub position: Vec3,
    pub health: f32,
    pub food: f32,
    pub version: String,
    pub game_mode: String,
    pub difficulty: String,
    pub time_of_day: i64,

    pub blocks: HashMap<BlockPos, String>,
    pub inventory: Vec<Item>,
    pub equipment: Equipment,
    pub entities: Vec<Entity>,
    pub other_players: Vec<(String, Option<Vec3>)>,
    pub containers: HashMap<BlockPos, ContainerState>,
    pub villager_trades: HashMap<i32, Vec<Option<Item>>>,
    pub recipes: Vec<Recipe>,

    pub window: Option<OpenWindow>,
    pub next_window_id: u32,
    pub controls: HashSet<ControlState>,
    pub chat_log: Vec<String>,
    pub pathfinder_loaded: bool,
    pub online: bool,

    pub login_script: Vec<(Duration, ConnectionEvent)>,
    pub goto_delay: Duration,
    pub dig_delay: Duration,
    pub failures: HashMap<SimOp, String>,
    pub failing_faces: HashSet<Face>,
    pub journal: Vec<SimCall>,
}

impl WorldState {
    fn new() -> Self {
        Self {
            username: "bot".into(),
            self_id: 1,
            position: Vec3::new(0.5, 64.0, 0.5),
            health: 20.0,
            food: 20.0,
            version: "1.20.4".into(),
            game_mode: "survival".into(),
            difficulty: "normal".into(),
            time_of_day: 6000,
            blocks: HashMap::new(),
            inventory: Vec::new(),
            equipment: Equipment::default(),
            entities: Vec::new(),
            other_players: Vec::new(),
            containers: HashMap::new(),
            villager_trades: HashMap::new(),
            recipes: Vec::new(),
            window: None,
            next_window_id: 1,
            controls: HashSet::new(),
            chat_log: Vec::new(),
            pathfinder_loaded: false,
            online: false,
            login_script: vec![(Duration::ZERO, ConnectionEvent::Ready)],
            goto_delay: Duration::ZERO,
            dig_delay: Duration::ZERO,
            failures: HashMap::new(),
            failing_faces: HashSet::new(),
            journal: Vec::new(),
        }
    }

    pub fn record(&mut self, call: SimCall) {
        self.journal.push(call);
    }

    /// The configured failure for `op`, if any.
    pub fn failure(&self, op: SimOp) -> Option<String> {
        self.failures.get(&op).cloned()
    }

    pub fn block_name(&self, pos: BlockPos) -> Option<String> {
        if pos.y < MIN_Y || pos.y > MAX_Y {
            return None;
        }
        Some(self.blocks.get(&pos).cloned().unwrap_or_else(|| "air".into()))
    }

    pub fn open_window(&mut self, kind: WindowKind) -> WindowId {
        let id = WindowId(self.next_window_id);
        self.next_window_id += 1;
        self.window = Some(OpenWindow { id, kind });
        id
    }

    pub fn is_window_open(&self, id: WindowId) -> bool {
        self.window.is_some_and(|w| w.id == id)
    }

    /// Add items to the inventory, topping up an existing stack first.
    pub fn add_to_inventory(&mut self, template: &Item, count: u32) {
        if count == 0 {
            return;
        }
        if let Some(stack) = self.inventory.iter_mut().find(|i| i.item_type == template.item_type) {
            stack.count += count;
            return;
        }
        let slot = self.free_inventory_slot();
        self.inventory.push(Item {
            count,
            slot,
            ..template.clone()
        });
        self.inventory.sort_by_key(|i| i.slot);
    }

    /// Remove `count` items of a type from the inventory, stack by stack.
    pub fn take_from_inventory(&mut self, item_type: u32, count: u32) -> Result<Item, String> {
        let available: u32 = self
            .inventory
            .iter()
            .filter(|i| i.item_type == item_type)
            .map(|i| i.count)
            .sum();
        let Some(template) = self.inventory.iter().find(|i| i.item_type == item_type).cloned() else {
            return Err(format!("No item of type {item_type} in inventory"));
        };
        if available < count {
            return Err(format!(
                "Not enough {} in inventory (have {available}, need {count})",
                template.name
            ));
        }

        let mut remaining = count;
        for stack in self.inventory.iter_mut().filter(|i| i.item_type == item_type) {
            let taken = remaining.min(stack.count);
            stack.count -= taken;
            remaining -= taken;
            if remaining == 0 {
                break;
            }
        }
        self.inventory.retain(|i| i.count > 0);
        let held_gone = self
            .equipment
            .held
            .as_ref()
            .is_some_and(|h| !self.inventory.iter().any(|i| i.slot == h.slot));
        if held_gone {
            self.equipment.held = None;
        }
        Ok(template)
    }

    pub fn inventory_count(&self, name: &str) -> u32 {
        self.inventory
            .iter()
            .filter(|i| i.is_named(name))
            .map(|i| i.count)
            .sum()
    }

    fn free_inventory_slot(&self) -> usize {
        let mut slot = FIRST_INVENTORY_SLOT;
        while self.inventory.iter().any(|i| i.slot == slot) {
            slot += 1;
        }
        slot
    }

    pub fn self_entity(&self) -> Entity {
        Entity {
            id: self.self_id,
            kind: "player".into(),
            name: None,
            username: Some(self.username.clone()),
            display_name: None,
            position: self.position,
        }
    }
}

/// Handle to a simulated world. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SimWorld {
    inner: Arc<Mutex<WorldState>>,
}

impl SimWorld {
    /// An empty world: air everywhere, the player at (0.5, 64, 0.5).
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorldState::new())),
        }
    }

    /// A small pre-populated world for offline sessions.
    pub fn demo() -> Self {
        let world = Self::new();
        for x in -8..=8 {
            for z in -8..=8 {
                world.set_block(BlockPos::new(x, 63, z), "grass_block");
            }
        }
        world.set_block(BlockPos::new(3, 64, 3), "stone");
        world.add_container(
            BlockPos::new(2, 64, 0),
            "chest",
            vec![
                Some(item("oak_log", 16)),
                None,
                Some(item("bread", 5)),
                Some(item("iron_ingot", 3)),
            ],
        );
        world.give(item("oak_planks", 32));
        world.give(item("stick", 8));
        world.give(Item {
            max_durability: Some(250),
            durability_used: 12,
            enchantments: vec!["efficiency".into()],
            ..item("iron_pickaxe", 1)
        });
        world.add_recipe(Recipe {
            result: "crafting_table".into(),
            result_count: 1,
            ingredients: vec![ingredient("oak_planks", 4)],
            requires_table: false,
        });
        world.add_recipe(Recipe {
            result: "stick".into(),
            result_count: 4,
            ingredients: vec![ingredient("oak_planks", 2)],
            requires_table: false,
        });
        world.add_entity(Entity {
            id: 42,
            kind: "mob".into(),
            name: Some("cow".into()),
            username: None,
            display_name: Some("Cow".into()),
            position: Vec3::new(4.0, 64.0, -2.0),
        });
        world.add_villager(
            77,
            "villager",
            Vec3::new(-2.0, 64.0, 1.0),
            vec![Some(item("emerald", 1)), Some(item("bread", 6))],
        );
        world.add_player("Alex", Some(Vec3::new(6.0, 64.0, 6.0)));
        world
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, WorldState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Builders ──────────────────────────────────────────────────────────

    pub fn set_username(&self, username: &str) {
        self.state().username = username.to_string();
    }

    pub fn set_position(&self, position: Vec3) {
        self.state().position = position;
    }

    pub fn set_block(&self, pos: BlockPos, name: &str) {
        self.state().blocks.insert(pos, name.to_string());
    }

    /// Put an item stack into the next free inventory slot.
    pub fn give(&self, stack: Item) {
        let mut state = self.state();
        let slot = state.free_inventory_slot();
        state.inventory.push(Item { slot, ..stack });
        state.inventory.sort_by_key(|i| i.slot);
    }

    /// Place a container block with the given slots (slot indices are
    /// rewritten to match their position).
    pub fn add_container(&self, pos: BlockPos, block_name: &str, slots: Vec<Option<Item>>) {
        let slots = slots
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.map(|item| Item { slot: i, ..item }))
            .collect();
        let mut state = self.state();
        state.blocks.insert(pos, block_name.to_string());
        state.containers.insert(pos, ContainerState { slots });
    }

    pub fn add_entity(&self, entity: Entity) {
        self.state().entities.push(entity);
    }

    pub fn add_villager(&self, id: i32, name: &str, position: Vec3, trades: Vec<Option<Item>>) {
        let trades = trades
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.map(|item| Item { slot: i, ..item }))
            .collect();
        let mut state = self.state();
        state.entities.push(Entity {
            id,
            kind: "villager".into(),
            name: Some(name.to_string()),
            username: None,
            display_name: Some("Villager".into()),
            position,
        });
        state.villager_trades.insert(id, trades);
    }

    pub fn add_player(&self, username: &str, position: Option<Vec3>) {
        self.state().other_players.push((username.to_string(), position));
    }

    pub fn add_recipe(&self, recipe: Recipe) {
        self.state().recipes.push(recipe);
    }

    // ── Behaviour ─────────────────────────────────────────────────────────

    /// Signals emitted after `connect`, each after its own delay.
    pub fn script_login(&self, events: Vec<(Duration, ConnectionEvent)>) {
        self.state().login_script = events;
    }

    /// How long `goto` takes to arrive.
    pub fn set_goto_delay(&self, delay: Duration) {
        self.state().goto_delay = delay;
    }

    /// How long `dig` takes to break a block.
    pub fn set_dig_delay(&self, delay: Duration) {
        self.state().dig_delay = delay;
    }

    /// Make every call of `op` fail with `message` until cleared.
    pub fn fail(&self, op: SimOp, message: &str) {
        self.state().failures.insert(op, message.to_string());
    }

    pub fn clear_failure(&self, op: SimOp) {
        self.state().failures.remove(&op);
    }

    /// Make placements against one face fail.
    pub fn fail_place_on(&self, face: Face) {
        self.state().failing_faces.insert(face);
    }

    // ── Inspection ────────────────────────────────────────────────────────

    /// Every client call recorded so far.
    pub fn calls(&self) -> Vec<SimCall> {
        self.state().journal.clone()
    }

    /// Recorded calls matching a predicate.
    pub fn calls_matching(&self, pred: impl Fn(&SimCall) -> bool) -> Vec<SimCall> {
        self.state().journal.iter().filter(|c| pred(c)).cloned().collect()
    }

    pub fn block(&self, pos: BlockPos) -> Option<String> {
        self.state().block_name(pos)
    }

    pub fn inventory(&self) -> Vec<Item> {
        self.state().inventory.clone()
    }

    pub fn inventory_count(&self, name: &str) -> u32 {
        self.state().inventory_count(name)
    }

    pub fn container_slots(&self, pos: BlockPos) -> Option<Vec<Option<Item>>> {
        self.state().containers.get(&pos).map(|c| c.slots.clone())
    }

    pub fn position(&self) -> Vec3 {
        self.state().position
    }

    pub fn current_window(&self) -> Option<WindowId> {
        self.state().window.map(|w| w.id)
    }

    pub fn active_controls(&self) -> HashSet<ControlState> {
        self.state().controls.clone()
    }

    pub fn chat_log(&self) -> Vec<String> {
        self.state().chat_log.clone()
    }

    pub fn is_online(&self) -> bool {
        self.state().online
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// An item stack with a derived type id and display name.
pub fn item(name: &str, count: u32) -> Item {
    Item {
        item_type: item_type_for(name),
        name: name.to_string(),
        display_name: display_name_for(name),
        count,
        slot: 0,
        max_durability: None,
        durability_used: 0,
        enchantments: Vec::new(),
    }
}

pub(crate) fn ingredient(name: &str, count: u32) -> mcremote_core::Ingredient {
    mcremote_core::Ingredient {
        name: name.to_string(),
        count,
    }
}

/// Stable type id for an item name (FNV-1a, folded into u16 range).
pub(crate) fn item_type_for(name: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash % 65_521
}

/// `oak_planks` → `Oak Planks`.
fn display_name_for(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_blocks_are_air_within_build_limits() {
        let world = SimWorld::new();
        assert_eq!(world.block(BlockPos::new(100, 70, -5)).as_deref(), Some("air"));
        assert_eq!(world.block(BlockPos::new(0, MIN_Y - 1, 0)), None);
    }

    #[test]
    fn give_assigns_distinct_slots() {
        let world = SimWorld::new();
        world.give(item("dirt", 10));
        world.give(item("cobblestone", 3));
        let inv = world.inventory();
        assert_eq!(inv.len(), 2);
        assert_ne!(inv[0].slot, inv[1].slot);
    }

    #[test]
    fn take_from_inventory_spans_stacks() {
        let world = SimWorld::new();
        world.give(item("dirt", 10));
        world.give(item("dirt", 5));
        let dirt = item_type_for("dirt");
        world.state().take_from_inventory(dirt, 12).unwrap();
        assert_eq!(world.inventory_count("dirt"), 3);
        assert!(world.state().take_from_inventory(dirt, 4).is_err());
    }

    #[test]
    fn display_names_are_title_cased() {
        assert_eq!(item("oak_planks", 1).display_name, "Oak Planks");
        assert_eq!(item("stick", 1).display_name, "Stick");
    }

    #[test]
    fn item_types_are_stable() {
        assert_eq!(item("bread", 1).item_type, item("bread", 9).item_type);
        assert_ne!(item("bread", 1).item_type, item("emerald", 1).item_type);
    }

    #[test]
    fn demo_world_has_a_chest_and_a_villager() {
        let world = SimWorld::demo();
        assert_eq!(world.block(BlockPos::new(2, 64, 0)).as_deref(), Some("chest"));
        assert!(world.state().villager_trades.contains_key(&77));
        assert!(world.inventory_count("oak_planks") > 0);
    }
}
