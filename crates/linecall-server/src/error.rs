//! Unified error type for the server binary.

use linecall_protocol::ProtocolError;
use linecall_room::RoomError;
use linecall_store::StoreError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Startup configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A store-level error (only fatal during startup).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Socket bind/accept failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Websocket handshake or framing failure.
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
