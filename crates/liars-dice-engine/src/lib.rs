//! Game-state engine for Liar's Dice.
//!
//! One [`Game`] holds all match state for one room: the roster, whose turn
//! it is, the standing bid, and whether a round is in play. Every operation
//! is a plain synchronous transition; callers that share a `Game` across
//! tasks must serialize access themselves (the room actor does this).
//!
//! ```text
//! add_player ─→ start ─→ make_bid ─→ … ─→ call_liar ─→ game_over?
//!                  ↑                                      │
//!                  └────────────── restart_game ←─────────┘
//! ```
//!
//! # Key types
//!
//! - [`Game`]: the engine itself
//! - [`PlayerId`]: stable roster index, never reused
//! - [`Bid`]: a `(count, face)` claim, ordered by `count * face`
//! - [`Challenge`]: the outcome of a resolved "liar!" call
//! - [`PublicState`]: the broadcast-safe snapshot (dice counts, no faces)

mod error;
mod game;
mod types;

pub use error::GameError;
pub use game::Game;
pub use types::{
    Bid, Challenge, Die, Player, PlayerId, PublicPlayer, PublicState, FACES,
    STARTING_DICE,
};
