//! Wire protocol for Liar's Dice.
//!
//! This crate defines what travels between a browser client and the
//! server:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`GameAction`],
//!   [`GameEvent`]): the message shapes on the wire.
//! - **Identity** ([`ClientId`], [`RoomCode`]): who is talking, and about
//!   which room.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about sockets or room bookkeeping; game data is
//! borrowed from `liars-dice-engine` so the snapshot a client receives is
//! exactly the engine's [`PublicState`](liars_dice_engine::PublicState).
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (engine calls)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientId, Envelope, GameAction, GameEvent, Payload, RoomCode,
    RoomListEntry, SystemMessage,
};
