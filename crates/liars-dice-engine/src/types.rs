//! Data model: players, bids, challenge outcomes and the public snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GameError;

/// A single die face, always in `1..=FACES`.
pub type Die = u8;

/// Number of faces on a die.
pub const FACES: Die = 6;

/// Dice each player holds at the start of a match.
pub const STARTING_DICE: usize = 6;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// A player's seat in the roster.
///
/// Assigned at join time as the roster length and never reused, so it stays
/// valid (and unique) after other players leave. Serialized as a plain
/// number so browser clients can compare it against `currentPlayer`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A seated player. Eliminated players keep their seat for display but
/// hold no dice and are skipped in turn order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub dice: Vec<Die>,
    pub has_lost: bool,
}

impl Player {
    /// `true` while the player still takes turns.
    pub fn is_active(&self) -> bool {
        !self.has_lost
    }
}

// ---------------------------------------------------------------------------
// Bid
// ---------------------------------------------------------------------------

/// A claim that at least `count` dice on the table show `face`.
///
/// Bids are ordered by their product `count * face`: a new bid must have a
/// strictly greater product than the one it replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bid {
    pub count: u32,
    pub face: Die,
}

impl Bid {
    /// Builds a bid, rejecting a zero count or a face outside `1..=6`.
    pub fn new(count: u32, face: Die) -> Result<Self, GameError> {
        if count == 0 || !(1..=FACES).contains(&face) {
            return Err(GameError::InvalidBid { count, face });
        }
        Ok(Self { count, face })
    }

    /// The value bids are ranked by.
    pub fn product(&self) -> u64 {
        u64::from(self.count) * u64::from(self.face)
    }

    /// `true` if this bid may replace `current`.
    pub fn beats(&self, current: &Bid) -> bool {
        self.product() > current.product()
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.count, self.face)
    }
}

// ---------------------------------------------------------------------------
// Challenge
// ---------------------------------------------------------------------------

/// How a call of "liar!" was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// The player who called liar.
    pub challenger: PlayerId,
    /// The player who placed the challenged bid.
    pub bidder: PlayerId,
    /// Whoever lost a die: the bidder if the bid was short, else the challenger.
    pub loser: PlayerId,
    /// The bid that was challenged.
    pub bid: Bid,
    /// How many dice actually showed the bid's face.
    pub actual: u32,
    /// `true` if the loser just lost their last die.
    pub eliminated: bool,
}

impl Challenge {
    /// `true` if the challenged bid overstated the table.
    pub fn challenger_was_right(&self) -> bool {
        self.actual < self.bid.count
    }
}

// ---------------------------------------------------------------------------
// PublicState
// ---------------------------------------------------------------------------

/// One roster entry as everyone may see it: a dice count, never the faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub dice_count: usize,
    pub has_lost: bool,
}

/// The broadcast-safe view of a match.
///
/// Field names follow the browser client's camelCase shape
/// (`currentPlayer`, `currentBid`, `diceCount`, `hasLost`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicState {
    pub players: Vec<PublicPlayer>,
    pub current_player: PlayerId,
    pub current_bid: Option<Bid>,
    pub started: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bid_new_rejects_zero_count_and_bad_faces() {
        assert!(Bid::new(0, 3).is_err());
        assert!(Bid::new(2, 0).is_err());
        assert!(Bid::new(2, 7).is_err());
        assert_eq!(Bid::new(2, 6).unwrap(), Bid { count: 2, face: 6 });
    }

    #[test]
    fn test_bid_beats_uses_product_not_components() {
        let current = Bid { count: 3, face: 4 };
        // 2x5 = 10 loses to 12 even though the face went up.
        assert!(!Bid { count: 2, face: 5 }.beats(&current));
        // 2x6 = 12 ties, which is not enough.
        assert!(!Bid { count: 2, face: 6 }.beats(&current));
        // 13x1 = 13 wins even though the face went down.
        assert!(Bid { count: 13, face: 1 }.beats(&current));
    }

    #[test]
    fn test_bid_product_does_not_overflow() {
        let bid = Bid { count: u32::MAX, face: 6 };
        assert_eq!(bid.product(), u64::from(u32::MAX) * 6);
    }

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&PlayerId(3)).unwrap(), "3");
        assert_eq!(PlayerId(3).to_string(), "P-3");
    }

    #[test]
    fn test_public_state_uses_camel_case_fields() {
        let state = PublicState {
            players: vec![PublicPlayer {
                id: PlayerId(0),
                name: "ana".into(),
                dice_count: 6,
                has_lost: false,
            }],
            current_player: PlayerId(0),
            current_bid: Some(Bid { count: 2, face: 3 }),
            started: true,
        };
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["currentPlayer"], 0);
        assert_eq!(json["currentBid"]["count"], 2);
        assert_eq!(json["players"][0]["diceCount"], 6);
        assert_eq!(json["players"][0]["hasLost"], false);
    }

    #[test]
    fn test_challenge_challenger_was_right() {
        let mut challenge = Challenge {
            challenger: PlayerId(2),
            bidder: PlayerId(1),
            loser: PlayerId(1),
            bid: Bid { count: 4, face: 4 },
            actual: 3,
            eliminated: false,
        };
        assert!(challenge.challenger_was_right());
        challenge.actual = 4;
        assert!(!challenge.challenger_was_right());
    }
}
