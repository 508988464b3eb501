//! Error types for the game core.

use linecall_protocol::PlayerId;

/// Rule violations raised by [`Match`](crate::Match) operations.
///
/// These never mutate state: a rejected move leaves the match exactly as
/// it was. The messages are client-facing (they end up in `error` events).
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The game has already been started.
    #[error("Game has already started")]
    AlreadyStarted,

    /// The operation requires a running game.
    #[error("Game has not started yet")]
    NotStarted,

    /// The game is over; no further moves are accepted.
    #[error("Game is over")]
    Over,

    /// A move arrived from a player who does not hold the turn.
    #[error("Not your turn")]
    NotYourTurn,

    /// Row or column outside the board.
    #[error("Cell ({row}, {col}) is out of bounds")]
    OutOfBounds { row: usize, col: usize },

    /// The cell's number has not been called yet.
    #[error("Number {0} has not been called yet")]
    NumberNotCalled(u16),

    /// The cell was already marked.
    #[error("Cell already selected")]
    CellAlreadySelected { row: usize, col: usize },

    /// Not enough players to start.
    #[error("Need at least {need} players to start")]
    InsufficientPlayers { have: usize, need: usize },

    /// The player has no seat in this match.
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),

    /// The player already has a seat in this match.
    #[error("player {0} is already in this game")]
    AlreadySeated(PlayerId),
}
