//! Core wire types: identities, client intents, and server events.
//!
//! The JSON shapes here are the compatibility contract with the browser
//! client: internally tagged messages (`{"type": "joinRoom", ...}`) with
//! camelCase field names.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// Assigned by the gateway when the connection is accepted and valid only
/// for the lifetime of that connection. Serializes as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A client-chosen room code, e.g. `"AB12CD"`.
///
/// Room codes are free text bounded by [`RoomCode::MAX_LEN`]; the
/// constructor trims whitespace and rejects empty or oversized codes.
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Longest accepted room code.
    pub const MAX_LEN: usize = 32;

    /// Validates and normalizes a raw room code.
    pub fn new(raw: impl Into<String>) -> Result<Self, crate::ProtocolError> {
        let code = raw.into().trim().to_string();
        if code.is_empty() {
            return Err(crate::ProtocolError::InvalidMessage(
                "room code must not be empty".into(),
            ));
        }
        if code.len() > Self::MAX_LEN {
            return Err(crate::ProtocolError::InvalidMessage(format!(
                "room code exceeds {} characters",
                Self::MAX_LEN
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Room processing returns `(Recipient, ServerEvent)` pairs; this enum
/// tells the dispatch layer where each one goes. Validation errors go to
/// the offending player only, committed state goes to everyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every player subscribed to the room.
    All,
    /// One specific player.
    Player(PlayerId),
    /// Everyone except the given player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// Public view of one player, embedded in state broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub username: String,
    pub score: u32,
    pub completed_lines: usize,
    pub is_host: bool,
    /// The player's own grid: a permutation of `1..=gridSize²`.
    pub grid: Vec<Vec<u16>>,
    pub marked_cells: Vec<Vec<bool>>,
}

/// Full authoritative snapshot of a room, broadcast after every committed
/// mutation. All subscribers of a room receive the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateView {
    pub room_id: RoomCode,
    pub players: Vec<PlayerView>,
    pub current_turn: Option<PlayerId>,
    pub called_numbers: Vec<u16>,
    pub turn_time_left: u32,
    pub grid_size: usize,
    pub game_started: bool,
    pub game_ended: bool,
    pub winner: Option<PlayerId>,
}

/// Compact room listing entry for the operator API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomCode,
    pub player_count: usize,
    pub game_started: bool,
    pub game_ended: bool,
}

// ---------------------------------------------------------------------------
// Client intents
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// `username` rides along on create/join because a player has no identity
/// beyond the display name they present (there is no account system).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientIntent {
    /// Create a new room with an unused code and join it as host.
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        room_id: String,
        #[serde(default)]
        username: Option<String>,
    },

    /// Join an existing room.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        #[serde(default)]
        username: Option<String>,
    },

    /// Ask whether a room code is in use (pre-join probe).
    #[serde(rename_all = "camelCase")]
    CheckRoom { room_id: String },

    /// Start the game in the player's room.
    #[serde(rename_all = "camelCase")]
    StartGame { room_id: String },

    /// Mark the cell at (row, col) on the sender's grid.
    #[serde(rename_all = "camelCase")]
    MarkCell {
        room_id: String,
        row: usize,
        col: usize,
    },

    /// Leave the room. Transport disconnects are treated identically.
    #[serde(rename_all = "camelCase")]
    LeaveRoom { room_id: String },
}

// ---------------------------------------------------------------------------
// Server events
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Sent to the creator (and the room) when a room is created.
    RoomCreated { room: GameStateView },

    /// Full room snapshot, sent on join and on demand.
    RoomState { room: GameStateView },

    /// Authoritative game state after a committed mutation.
    GameState { state: GameStateView },

    /// Answer to a `checkRoom` probe.
    #[serde(rename_all = "camelCase")]
    RoomCheckResult { exists: bool, room_id: RoomCode },

    /// A new player entered the room.
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        room: GameStateView,
        new_player: PlayerView,
    },

    /// A player left; carries the remaining roster.
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        room_id: RoomCode,
        players: Vec<PlayerView>,
    },

    /// Periodic countdown for the active turn.
    #[serde(rename_all = "camelCase")]
    TurnCountdown {
        room_id: RoomCode,
        seconds_left: u32,
    },

    /// The active player ran out of time and was auto-played.
    PlayerSkipped { username: String },

    /// A player completed enough lines to win.
    GameWon { winner: String },

    /// A request was rejected; sent to the offending connection only.
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
