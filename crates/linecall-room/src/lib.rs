//! Room lifecycle management for Linecall.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! match state, player list, and turn clock. All writes to a room's
//! state flow through the actor's command channel, so a client intent
//! and a turn expiry can never interleave mid-mutation.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/destroys rooms, routes players
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomUpdate`]: fire-and-forget notifications for the store mirror

mod error;
mod registry;
mod room;
mod update;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{EventSender, LeaveReply, RoomHandle, RoomInfo};
pub use update::{RoomUpdate, UpdateSender};
