//! # mcremote Core
//!
//! Domain types, traits, and error definitions for the mcremote tool server.
//! This crate defines the seam to the external game-client library, the
//! single process-wide [`Session`], the discriminated [`ToolOutcome`] every
//! action resolves to, and the [`Tool`] trait the dispatch table is built on.
//!
//! ## Design Philosophy
//!
//! The game client itself (protocol decoding, pathfinding, world simulation)
//! lives behind [`GameConnector`] and [`GameClient`]. Implementations live in
//! their own crates, so the dispatcher can be exercised against an in-memory
//! world in tests and against a real protocol client in production.

pub mod error;
pub mod game;
pub mod outcome;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{GameError, ToolError};
pub use game::{
    Block, BlockPos, ConnectOptions, ConnectionEvent, ContainerWindow, ControlState, Entity,
    EquipDestination, Equipment, Face, GameClient, GameConnector, GameInfo, Ingredient, Item,
    PendingConnection, PlayerInfo, Recipe, TradeWindow, Vec3, WindowId,
};
pub use outcome::{Content, ToolOutcome, ToolResponse};
pub use session::{ConnectError, ConnectionParams, ConnectionState, DisconnectError, Session};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolRegistry};
