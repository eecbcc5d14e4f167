//! Error types for the room layer.

use liars_dice_engine::GameError;
use liars_dice_protocol::{ClientId, RoomCode};

/// Reasons a room request was refused.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomCode),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Another seated player already uses this name.
    #[error("name {0:?} is already taken in this room")]
    NameTaken(String),

    #[error("invalid player name: {0}")]
    InvalidName(String),

    /// Only the room creator may start the game.
    #[error("only the room creator can start the game")]
    NotCreator,

    #[error("need at least {need} players to start, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },

    /// The room is in a state that doesn't allow this operation, such as
    /// bidding before the game has started.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    #[error("client {0} is already in room {1}")]
    AlreadyInRoom(ClientId, RoomCode),

    #[error("client {0} is not in a room")]
    NotInRoom(ClientId),

    /// The room's command channel is closed; the actor has stopped.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),

    /// The engine rejected a move.
    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// HTTP-style status code reported to the client.
    pub fn code(&self) -> u16 {
        match self {
            Self::InvalidName(_) | Self::Game(_) => 400,
            Self::NotCreator => 403,
            Self::NotFound(_) | Self::NotInRoom(_) => 404,
            Self::RoomFull(_)
            | Self::NameTaken(_)
            | Self::NotEnoughPlayers { .. }
            | Self::InvalidState(_)
            | Self::AlreadyInRoom(..) => 409,
            Self::Unavailable(_) => 503,
        }
    }
}
