//! Unified error type for the Liar's Dice server.

use liars_dice_protocol::ProtocolError;
use liars_dice_room::RoomError;
use liars_dice_transport::TransportError;

/// Top-level error wrapping every layer's error, so `?` converts across
/// crate boundaries.
#[derive(Debug, thiserror::Error)]
pub enum LiarsDiceError {
    /// Connection, send, or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode, decode, or handshake rule violation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room refused a request.
    #[error(transparent)]
    Room(#[from] RoomError),
}
