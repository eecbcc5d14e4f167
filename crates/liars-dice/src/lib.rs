//! # Liar's Dice
//!
//! A multiplayer Liar's Dice server for browser clients.
//!
//! Players connect over WebSocket, open or join a room by its six-letter
//! code, and play a match that the server referees. Every bid and
//! challenge goes through the room's [`Game`](liars_dice_engine::Game);
//! clients only ever see the public table and their own dice.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use liars_dice::prelude::*;
//!
//! # async fn run() -> Result<(), LiarsDiceError> {
//! liars_dice::init_logging();
//! let server = LiarsDiceServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod logging;
mod server;

pub use error::LiarsDiceError;
pub use logging::{DEFAULT_FILTER, init_logging};
pub use server::{LiarsDiceServer, LiarsDiceServerBuilder, PROTOCOL_VERSION};

/// Everything needed to run a server or write a client against it.
pub mod prelude {
    pub use crate::{
        LiarsDiceError, LiarsDiceServer, LiarsDiceServerBuilder, PROTOCOL_VERSION,
    };
    pub use liars_dice_engine::{Bid, Challenge, PlayerId, PublicPlayer, PublicState};
    pub use liars_dice_protocol::{
        ClientId, Codec, Envelope, GameAction, GameEvent, JsonCodec, Payload, RoomCode,
        RoomListEntry, SystemMessage,
    };
    pub use liars_dice_room::{RoomConfig, RoomError};
}
