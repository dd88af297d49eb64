//! Game-client seam: the object model of the external game connection.
//!
//! Everything that speaks the game protocol (login, world simulation,
//! pathfinding, window bookkeeping) lives behind these traits. The tool
//! server only issues calls against them and formats what comes back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::GameError;

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Integer block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block containing the given world-space point.
    pub fn containing(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.floor() as i32,
            y: y.floor() as i32,
            z: z.floor() as i32,
        }
    }

    /// The neighbouring block on the given side.
    pub const fn offset(self, face: Face) -> Self {
        let (dx, dy, dz) = face.vector();
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// The block a placement against `face` must be anchored on: the one on
    /// the opposite side of that face.
    pub const fn anchor_for(self, face: Face) -> Self {
        let (dx, dy, dz) = face.vector();
        Self {
            x: self.x - dx,
            y: self.y - dy,
            z: self.z - dz,
        }
    }

    pub fn center(&self) -> Vec3 {
        Vec3::new(
            f64::from(self.x) + 0.5,
            f64::from(self.y),
            f64::from(self.z) + 0.5,
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X={}, Y={}, Z={}", self.x, self.y, self.z)
    }
}

/// The six axis-aligned block faces, in placement probing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Up,
    Down,
    East,
    West,
    South,
    North,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Up,
        Face::Down,
        Face::East,
        Face::West,
        Face::South,
        Face::North,
    ];

    /// Unit normal of this face.
    pub const fn vector(self) -> (i32, i32, i32) {
        match self {
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
            Face::South => (0, 0, 1),
            Face::North => (0, 0, -1),
        }
    }
}

/// A block as reported by the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub position: BlockPos,
}

impl Block {
    pub fn is_air(&self) -> bool {
        self.name == "air"
    }
}

/// An item stack in an inventory or window slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Numeric item type id used by the protocol
    pub item_type: u32,

    /// Internal name, e.g. `oak_planks`
    pub name: String,

    /// Human-readable name, e.g. `Oak Planks`
    pub display_name: String,

    pub count: u32,

    /// Slot index within its inventory or window
    pub slot: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_durability: Option<u32>,

    #[serde(default)]
    pub durability_used: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enchantments: Vec<String>,
}

impl Item {
    /// Case-insensitive match on the internal name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Display name, falling back to the internal name.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// A tracked entity (mob, player, dropped item, villager...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i32,

    /// Entity type, e.g. `player`, `mob`, `villager`
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    pub position: Vec3,
}

impl Entity {
    /// Best available name for display, if any.
    pub fn known_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.display_name.as_deref())
    }
}

/// A player listed on the server, with an entity when within view distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

/// Server-side facts about the current game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub version: String,
    pub game_mode: String,
    pub difficulty: String,
    pub time_of_day: i64,
    pub players_online: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food: Option<f32>,
}

/// What the player is holding and wearing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub held: Option<Item>,
    pub head: Option<Item>,
    pub torso: Option<Item>,
    pub legs: Option<Item>,
    pub feet: Option<Item>,
}

/// Movement control keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlState {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ControlState::Forward => "forward",
            ControlState::Back => "back",
            ControlState::Left => "left",
            ControlState::Right => "right",
            ControlState::Jump => "jump",
            ControlState::Sprint => "sprint",
            ControlState::Sneak => "sneak",
        };
        f.write_str(s)
    }
}

/// Where an item can be equipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipDestination {
    #[default]
    Hand,
    Head,
    Torso,
    Legs,
    Feet,
}

impl fmt::Display for EquipDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EquipDestination::Hand => "hand",
            EquipDestination::Head => "head",
            EquipDestination::Torso => "torso",
            EquipDestination::Legs => "legs",
            EquipDestination::Feet => "feet",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub count: u32,
}

/// A crafting recipe the player can currently make.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Output item name
    pub result: String,
    pub result_count: u32,
    pub ingredients: Vec<Ingredient>,
    /// Whether a crafting table is needed
    #[serde(default)]
    pub requires_table: bool,
}

/// Protocol-level window identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options for opening a game connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Protocol version; `None` negotiates automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field(
                "password",
                &self.password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("version", &self.version)
            .finish()
    }
}

/// One-shot lifecycle signals emitted by a connection while it logs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The player has spawned; the session is usable.
    Ready,
    /// Login failed or the connection dropped.
    Error(String),
}

/// A connection that has been opened but not yet reported ready.
pub struct PendingConnection {
    pub client: Arc<dyn GameClient>,
    pub events: mpsc::UnboundedReceiver<ConnectionEvent>,
}

/// Opens connections to a game server.
#[async_trait]
pub trait GameConnector: Send + Sync {
    /// Backend name, e.g. "sim".
    fn name(&self) -> &str;

    /// Start connecting. Readiness is reported on the returned event stream.
    async fn connect(&self, options: ConnectOptions) -> Result<PendingConnection, GameError>;
}

/// An open container window (chest, furnace, barrel...).
#[async_trait]
pub trait ContainerWindow: Send + Sync {
    fn id(&self) -> WindowId;

    /// The container's own slots in window order; empty slots are `None`.
    fn slots(&self) -> Vec<Option<Item>>;

    /// Move `count` items of `item_type` from the container to the player.
    async fn withdraw(&self, item_type: u32, count: u32) -> Result<(), GameError>;

    /// Move `count` items of `item_type` from the player to the container.
    async fn deposit(&self, item_type: u32, count: u32) -> Result<(), GameError>;
}

/// An open villager trading window.
#[async_trait]
pub trait TradeWindow: Send + Sync {
    fn id(&self) -> WindowId;

    /// Offered trades in window order; empty slots are `None`.
    fn slots(&self) -> Vec<Option<Item>>;

    /// Execute the trade at a zero-based index `count` times.
    async fn trade(&self, index: usize, count: u32) -> Result<(), GameError>;
}

/// The live game connection: world queries plus asynchronous actions.
#[async_trait]
pub trait GameClient: Send + Sync {
    fn username(&self) -> String;
    fn entity_id(&self) -> i32;
    fn position(&self) -> Vec3;
    fn block_at(&self, pos: BlockPos) -> Option<Block>;
    fn inventory_items(&self) -> Vec<Item>;
    fn equipment(&self) -> Equipment;
    fn entities(&self) -> Vec<Entity>;
    fn entity(&self, id: i32) -> Option<Entity>;
    fn players(&self) -> Vec<PlayerInfo>;
    fn game_info(&self) -> GameInfo;

    /// Window the server currently considers open, if any.
    fn current_window(&self) -> Option<WindowId>;

    /// Attach the pathfinding extension. Called once per connection.
    fn load_pathfinder(&self) -> Result<(), GameError>;

    fn chat(&self, message: &str) -> Result<(), GameError>;
    fn set_control_state(&self, control: ControlState, active: bool);
    fn clear_control_states(&self);
    async fn look_at(&self, target: Vec3) -> Result<(), GameError>;

    /// Pathfind to stand in the given block.
    async fn goto(&self, goal: BlockPos) -> Result<(), GameError>;
    fn follow(&self, entity_id: i32, distance: f64) -> Result<(), GameError>;
    /// Abandon the active pathfinding goal.
    fn stop_pathing(&self);

    async fn dig(&self, block: &Block) -> Result<(), GameError>;
    fn stop_digging(&self);
    async fn place_block(&self, reference: &Block, face: Face) -> Result<(), GameError>;

    async fn equip(&self, item: &Item, destination: EquipDestination) -> Result<(), GameError>;
    async fn toss(&self, item_type: u32, count: u32) -> Result<(), GameError>;

    async fn attack(&self, entity: &Entity) -> Result<(), GameError>;
    async fn use_on(&self, entity: &Entity) -> Result<(), GameError>;

    /// Recipes craftable with the current inventory.
    fn recipes(&self) -> Vec<Recipe>;
    async fn craft(&self, recipe: &Recipe, count: u32) -> Result<(), GameError>;

    async fn open_container(&self, block: &Block) -> Result<Box<dyn ContainerWindow>, GameError>;
    async fn open_villager(&self, villager: &Entity) -> Result<Box<dyn TradeWindow>, GameError>;
    async fn close_window(&self, window: WindowId) -> Result<(), GameError>;

    /// Leave the server gracefully.
    fn quit(&self) -> Result<(), GameError>;
}
