//! Error types for the game engine.

use crate::{Bid, PlayerId};

/// Why the engine refused an operation.
///
/// A refused operation never changes match state. Most variants are
/// ordinary rejections of a player's action; `NoPreviousBidder` is a
/// structural anomaly that should not happen under normal play.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Someone other than the current player tried to act.
    #[error("not {player}'s turn (current player is {current})")]
    NotYourTurn { player: PlayerId, current: PlayerId },

    /// The new bid's product does not strictly exceed the standing bid's.
    #[error("bid {bid} does not beat {current}")]
    BidTooLow { bid: Bid, current: Bid },

    /// Count must be positive and face must be 1-6.
    #[error("invalid bid: count {count}, face {face}")]
    InvalidBid { count: u32, face: u8 },

    /// "Liar!" was called with no bid on the table.
    #[error("there is no bid to challenge")]
    NoBidToChallenge,

    /// The standing bid's bidder has left or is out of the match.
    #[error("no previous bidder found before {current}")]
    NoPreviousBidder { current: PlayerId },

    /// The id does not name a seated player.
    #[error("player {0} not found")]
    UnknownPlayer(PlayerId),
}
