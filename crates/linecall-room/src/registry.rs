//! Room registry: creates, tracks, and routes players to rooms.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use linecall_game::Rules;
use linecall_protocol::{PlayerId, RoomCode, RoomSummary};

use crate::room::spawn_room;
use crate::{EventSender, RoomError, RoomHandle, UpdateSender};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// The registry's index maps, guarded as one unit.
struct Tables {
    /// Active rooms, keyed by room code.
    rooms: HashMap<RoomCode, RoomHandle>,
    /// Maps each player to the room they're currently in.
    /// A player can be in at most ONE room at a time (key invariant).
    player_rooms: HashMap<PlayerId, RoomCode>,
}

/// Manages all active rooms and tracks which player is in which room.
///
/// This is the entry point for room operations from the gateway and the
/// HTTP sidecar. Room codes are chosen by clients; the registry enforces
/// uniqueness and the one-room-at-a-time invariant.
///
/// The index maps sit behind a plain `Mutex` that is only ever held for
/// map access, never across an actor round-trip, so intents for
/// different rooms proceed in parallel. Joins reserve the player's seat
/// in the index first and roll the reservation back if the actor
/// refuses.
pub struct RoomRegistry {
    rules: Rules,
    /// Rooms idle longer than this are destroyed by [`sweep`](Self::sweep).
    room_ttl: Duration,
    tables: Mutex<Tables>,
    updates: UpdateSender,
}

impl RoomRegistry {
    pub fn new(rules: Rules, room_ttl: Duration, updates: UpdateSender) -> Self {
        Self {
            rules: rules.validated(),
            room_ttl,
            tables: Mutex::new(Tables {
                rooms: HashMap::new(),
                player_rooms: HashMap::new(),
            }),
            updates,
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a room with a client-chosen code and seats the creator as
    /// host.
    pub async fn create_room(
        &self,
        room_id: RoomCode,
        player_id: PlayerId,
        username: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let handle = {
            let mut tables = self.tables();
            if let Some(current) = tables.player_rooms.get(&player_id) {
                return Err(RoomError::AlreadyInRoom(player_id, current.clone()));
            }
            if tables.rooms.contains_key(&room_id) {
                return Err(RoomError::Duplicate(room_id));
            }

            let handle = spawn_room(
                room_id.clone(),
                self.rules.clone(),
                self.updates.clone(),
                DEFAULT_CHANNEL_SIZE,
            );
            tables.rooms.insert(room_id.clone(), handle.clone());
            tables.player_rooms.insert(player_id, room_id.clone());
            handle
        };

        if let Err(err) = handle.join(player_id, username, sender).await {
            // The creator never got a seat, so the room goes too.
            self.release_seat(player_id, &room_id, true);
            return Err(err);
        }
        tracing::info!(%room_id, %player_id, "room created");
        Ok(())
    }

    /// Adds a player to an existing room.
    ///
    /// Enforces the "one room at a time" invariant. Capacity and
    /// late-join checks happen inside the room actor; a refusal rolls
    /// the seat reservation back.
    pub async fn join_room(
        &self,
        room_id: RoomCode,
        player_id: PlayerId,
        username: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let handle = {
            let mut tables = self.tables();
            if let Some(current) = tables.player_rooms.get(&player_id) {
                return Err(RoomError::AlreadyInRoom(player_id, current.clone()));
            }
            let handle = tables
                .rooms
                .get(&room_id)
                .cloned()
                .ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
            tables.player_rooms.insert(player_id, room_id.clone());
            handle
        };

        match handle.join(player_id, username, sender).await {
            Ok(()) => Ok(()),
            Err(err) => {
                // An unreachable actor is as good as gone.
                let reap = matches!(err, RoomError::Unavailable(_));
                self.release_seat(player_id, &room_id, reap);
                Err(err)
            }
        }
    }

    /// Whether a room with this code currently exists.
    pub fn check_room(&self, room_id: &RoomCode) -> bool {
        self.tables().rooms.contains_key(room_id)
    }

    /// Removes a player from their current room. Empty rooms are
    /// dropped immediately rather than waiting for the idle sweep.
    ///
    /// Returns the room the player left.
    pub async fn leave_room(&self, player_id: PlayerId) -> Result<RoomCode, RoomError> {
        let (room_id, handle) = {
            let mut tables = self.tables();
            let room_id = tables
                .player_rooms
                .remove(&player_id)
                .ok_or(RoomError::NotInRoom(player_id))?;
            let handle = tables.rooms.get(&room_id).cloned();
            (room_id, handle)
        };
        let Some(handle) = handle else {
            return Err(RoomError::NotFound(room_id));
        };

        match handle.leave(player_id).await {
            Ok(reply) => {
                if reply.now_empty {
                    // The actor stops itself once empty.
                    self.tables().rooms.remove(&room_id);
                    tracing::info!(%room_id, "room emptied, removed");
                }
                Ok(room_id)
            }
            Err(err) => {
                if matches!(err, RoomError::Unavailable(_)) {
                    self.tables().rooms.remove(&room_id);
                }
                Err(err)
            }
        }
    }

    /// Asks a player's room to start its game.
    pub async fn start_game(
        &self,
        player_id: PlayerId,
        room_id: &RoomCode,
    ) -> Result<(), RoomError> {
        self.handle_for(player_id, room_id)?.start(player_id).await
    }

    /// Routes a mark attempt to the player's room.
    pub async fn mark_cell(
        &self,
        player_id: PlayerId,
        room_id: &RoomCode,
        row: usize,
        col: usize,
    ) -> Result<(), RoomError> {
        self.handle_for(player_id, room_id)?
            .mark(player_id, row, col)
            .await
    }

    /// Returns the room code a player is currently in, if any.
    pub fn player_room(&self, player_id: PlayerId) -> Option<RoomCode> {
        self.tables().player_rooms.get(&player_id).cloned()
    }

    /// Summaries of all active rooms, for the HTTP listing.
    ///
    /// Rooms that fail to respond (e.g., shutting down) are skipped.
    pub async fn room_summaries(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.tables().rooms.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(info) = handle.get_info().await {
                summaries.push(info.summary());
            }
        }
        summaries
    }

    /// Destroys rooms idle longer than the TTL. Returns how many were
    /// removed.
    pub async fn sweep(&self) -> usize {
        let candidates: Vec<(RoomCode, RoomHandle)> = self
            .tables()
            .rooms
            .iter()
            .map(|(room_id, handle)| (room_id.clone(), handle.clone()))
            .collect();

        let mut expired = Vec::new();
        for (room_id, handle) in candidates {
            match handle.get_info().await {
                Ok(info) if info.idle >= self.room_ttl => expired.push((room_id, handle)),
                Ok(_) => {}
                // The actor is gone; reap the handle.
                Err(_) => expired.push((room_id, handle)),
            }
        }

        let mut removed = 0;
        for (room_id, handle) in expired {
            let unindexed = {
                let mut tables = self.tables();
                // The code may have been reused while we queried; only
                // remove the entry if it is still this room.
                let same = tables
                    .rooms
                    .get(&room_id)
                    .is_some_and(|current| current.same_room(&handle));
                if same {
                    tables.rooms.remove(&room_id);
                    tables.player_rooms.retain(|_, rid| rid != &room_id);
                }
                same
            };
            if unindexed {
                let _ = handle.shutdown().await;
                tracing::info!(%room_id, "idle room destroyed");
                removed += 1;
            }
        }
        removed
    }

    pub fn room_count(&self) -> usize {
        self.tables().rooms.len()
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Rolls back a seat reservation whose join was refused.
    fn release_seat(&self, player_id: PlayerId, room_id: &RoomCode, drop_room: bool) {
        let mut tables = self.tables();
        if tables.player_rooms.get(&player_id) == Some(room_id) {
            tables.player_rooms.remove(&player_id);
        }
        if drop_room {
            tables.rooms.remove(room_id);
        }
    }

    fn handle_for(
        &self,
        player_id: PlayerId,
        room_id: &RoomCode,
    ) -> Result<RoomHandle, RoomError> {
        let tables = self.tables();
        match tables.player_rooms.get(&player_id) {
            Some(current) if current == room_id => {}
            _ => return Err(RoomError::NotInRoom(player_id)),
        }
        tables
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }
}
