//! Fire-and-forget room notifications for the persistence mirror.

use linecall_protocol::{PlayerId, RoomCode};
use tokio::sync::mpsc;

/// Channel sender the room layer pushes [`RoomUpdate`]s into.
pub type UpdateSender = mpsc::UnboundedSender<RoomUpdate>;

/// Something persistence-worthy happened in a room.
///
/// Updates are best-effort: room actors push them without waiting, and
/// a full or closed channel never blocks gameplay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpdate {
    PlayerJoined {
        room_id: RoomCode,
        player: PlayerId,
        username: String,
    },
    PlayerLeft {
        room_id: RoomCode,
        player: PlayerId,
    },
    GameStarted {
        room_id: RoomCode,
        /// Everyone seated when the game began, for per-player counters.
        players: Vec<PlayerId>,
    },
    GameEnded {
        room_id: RoomCode,
        winner: PlayerId,
        username: String,
        score: u32,
    },
    RoomClosed {
        room_id: RoomCode,
    },
}
