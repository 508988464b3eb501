//! Linecall: an authoritative multiplayer bingo server.
//!
//! The server owns all game state. Browsers connect over a websocket,
//! send intents, and receive authoritative snapshots; an HTTP sidecar
//! serves health, leaderboard, and an operator room listing. Layers:
//! gateway (websocket) → registry (room actors) → match (rules), with a
//! best-effort Redis mirror hanging off the side.

mod config;
mod error;
mod gateway;
mod http;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::ServerError;
pub use http::router;
pub use server::{LinecallServer, ServerState};
