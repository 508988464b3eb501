//! Error types for the room layer.

use linecall_protocol::{PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// The messages are client-facing: the gateway forwards them verbatim
/// in `error` events.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("Room not found")]
    NotFound(RoomCode),

    /// A room with this code already exists.
    #[error("Room already exists")]
    Duplicate(RoomCode),

    /// The room is full: no more player slots available.
    #[error("Room is full")]
    Full(RoomCode),

    /// The room's game has already ended; it no longer accepts players.
    #[error("Game has already ended")]
    Ended(RoomCode),

    /// The player is already in a room.
    #[error("Already in a room")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The player is not in any room.
    #[error("Not in a room")]
    NotInRoom(PlayerId),

    /// The room's command channel is full or closed.
    #[error("Room is unavailable")]
    Unavailable(RoomCode),
}
