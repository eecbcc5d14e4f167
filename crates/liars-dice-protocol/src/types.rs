//! Message types for the Liar's Dice wire format.
//!
//! Everything here is serialized with serde. Enum tags are chosen so the
//! JSON is easy to switch on from TypeScript: `{"type": "MakeBid", ...}`.

use std::fmt;

use liars_dice_engine::{Bid, Challenge, Die, PlayerId, PublicState};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one client connection.
///
/// Assigned by the server during the handshake; there is no login, so this
/// is the only identity a client has. It is distinct from the engine's
/// [`PlayerId`], which is a seat inside one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

/// A short, shareable room code such as `K7QX2M`.
///
/// Codes are upper-case ASCII letters and digits. Parsing upper-cases its
/// input, so players can type a code in any case. Serialized as a plain
/// string and validated on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Longest code accepted from a client.
    pub const MAX_LEN: usize = 16;

    /// Normalizes and validates a code typed by a player.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidMessage`] if the code is empty, too long, or
    /// contains anything but ASCII letters and digits.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() || code.len() > Self::MAX_LEN {
            return Err(ProtocolError::InvalidMessage(format!(
                "room code must be 1-{} characters",
                Self::MAX_LEN
            )));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ProtocolError::InvalidMessage(
                "room code must be letters and digits".into(),
            ));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SystemMessage: connection and room plumbing
// ---------------------------------------------------------------------------

/// A room as shown in the lobby list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_code: RoomCode,
    /// Seated players, eliminated or not.
    pub player_count: usize,
    pub max_players: usize,
    /// `true` while a round is being played.
    pub in_progress: bool,
}

/// Messages that are not game moves: handshake, keep-alive, and moving
/// between rooms.
///
/// Internally tagged: `{"type": "JoinRoom", "room_code": "ABC123", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → Server: first message on every connection.
    Handshake { version: u32 },

    /// Server → Client: accepted; this is your connection identity.
    HandshakeAck { client_id: ClientId, server_time: u64 },

    /// Either direction: closing, with a reason for the logs.
    Disconnect { reason: String },

    // -- Heartbeat --
    /// Client → Server: keep-alive, echoed back for RTT.
    Heartbeat { client_time: u64 },

    /// Server → Client: reply to [`SystemMessage::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Rooms --
    /// Client → Server: open a new room and sit in it as its creator.
    CreateRoom { player_name: String },

    /// Client → Server: sit in an existing room.
    JoinRoom { room_code: RoomCode, player_name: String },

    /// Server → Client: you are seated in `room_code` as `player_id`.
    RoomJoined { room_code: RoomCode, player_id: PlayerId },

    /// Client → Server: stand up and leave the current room.
    LeaveRoom,

    /// Server → Client: acknowledgement of [`SystemMessage::LeaveRoom`].
    RoomLeft { room_code: RoomCode },

    /// Client → Server: list rooms that can be joined.
    ListRooms,

    /// Server → Client: reply to [`SystemMessage::ListRooms`].
    RoomList { rooms: Vec<RoomListEntry> },

    // -- Errors --
    /// Server → Client: a request was refused. `code` follows HTTP
    /// conventions (400, 403, 404, 409, 503).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Game traffic
// ---------------------------------------------------------------------------

/// Client → Server: something a seated player wants to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameAction {
    /// Room creator only: begin the round.
    StartGame,
    /// Raise the bid to `count` dice showing `face`.
    MakeBid { count: u32, face: Die },
    /// Challenge the standing bid.
    CallLiar,
}

/// Server → Client: something that happened in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Public snapshot, sent to everyone after every change.
    State { state: PublicState },
    /// Your own dice. Only ever sent to their owner.
    Dice { dice: Vec<Die> },
    /// The creator started a round.
    GameStarted,
    /// A bid was accepted.
    BidPlaced { player_id: PlayerId, bid: Bid },
    /// A challenge was resolved and a die was lost.
    ChallengeResolved { challenge: Challenge },
    /// One player is left standing; the match has been reset.
    MatchOver { winner: String },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// Adjacently tagged so the handler can route on the outer tag alone:
/// `{"type": "Action", "data": {"type": "CallLiar"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Action(GameAction),
    Event(GameEvent),
}

/// Every frame on the wire is one envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender sequence number.
    pub seq: u64,
    /// Milliseconds since the sender started.
    pub timestamp: u64,
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
