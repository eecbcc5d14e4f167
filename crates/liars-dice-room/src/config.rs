//! Room configuration and state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a [`RoomManager`](crate::RoomManager)
/// creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seated players needed before the creator may start.
    pub min_players: usize,

    /// Seats per room, eliminated players included.
    pub max_players: usize,

    /// Length of generated room codes.
    pub code_len: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 6,
            code_len: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// WaitingForPlayers ⇄ InProgress
///         ↘            ↙
///          Destroying
/// ```
///
/// - **WaitingForPlayers**: players gather; the creator may start.
/// - **InProgress**: a match is being played. Newcomers may still sit
///   down but watch until the next match.
/// - **Destroying**: the room is shutting down. Terminal.
///
/// A match that produces a winner returns the room to
/// `WaitingForPlayers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    WaitingForPlayers,
    InProgress,
    Destroying,
}

impl RoomState {
    /// Returns `true` if the room still seats newcomers.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers | Self::InProgress)
    }

    /// Returns `true` while a match is being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::WaitingForPlayers, Self::InProgress)
                | (Self::InProgress, Self::WaitingForPlayers)
                | (Self::WaitingForPlayers, Self::Destroying)
                | (Self::InProgress, Self::Destroying)
        )
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Destroying => write!(f, "Destroying"),
        }
    }
}
