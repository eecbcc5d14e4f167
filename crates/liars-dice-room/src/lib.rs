//! Rooms for Liar's Dice.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`Game`](liars_dice_engine::Game) and the outbound channels of everyone
//! seated in it. The room applies table rules the engine does not know
//! about: seat limits, unique names, and that only the creator may start.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates/destroys rooms, routes clients
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: seat limits and code length

mod code;
mod config;
mod error;
mod manager;
mod room;

pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
