//! In-memory simulated game world for mcremote.
//!
//! Implements [`GameConnector`](mcremote_core::GameConnector) and
//! [`GameClient`](mcremote_core::GameClient) over a small block/entity model
//! so the tool server can run offline and be tested deterministically. Every
//! call a client makes is recorded in a journal ([`SimCall`]) and any
//! operation can be made to fail ([`SimOp`]).

pub mod client;
pub mod connector;
pub mod world;

pub use client::SimClient;
pub use connector::SimConnector;
pub use world::{SimCall, SimOp, SimWorld, item};
