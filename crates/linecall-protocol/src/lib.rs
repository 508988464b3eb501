//! Wire protocol for Linecall.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`ClientIntent`], [`ServerEvent`], [`RoomCode`],
//!   [`PlayerId`], the snapshot views): the structures that travel
//!   on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while
//!   encoding/decoding.
//!
//! The protocol layer sits below the room and gateway layers: it knows
//! nothing about connections, rooms, or game rules, only about message
//! shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientIntent, GameStateView, PlayerId, PlayerView, Recipient,
    RoomCode, RoomSummary, ServerEvent,
};
