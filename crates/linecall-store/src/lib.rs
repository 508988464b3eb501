//! Best-effort Redis mirror for room and player state.
//!
//! The store is a write-behind reflection of in-memory state, never a
//! source of truth for gameplay: every write is fire-and-forget with a
//! bounded retry, and a dead Redis degrades the server to
//! memory-only operation instead of taking rooms down with it.
//!
//! Key layout:
//!
//! ```text
//! room:{code}     hash  players, started, ended, winner, updated_at
//! player:{id}     hash  username, room, games_played, games_won,
//!                       score, joined_at
//! leaderboard     zset  cumulative score -> username
//! ```
//!
//! Career fields (`games_played`, `games_won`, `score`, the leaderboard
//! entry) are increments, so a repeat winner accumulates across games.

mod error;
mod records;

pub use error::StoreError;
pub use records::LeaderboardEntry;

use std::time::Duration;

use chrono::Utc;
use linecall_room::RoomUpdate;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const LEADERBOARD_KEY: &str = "leaderboard";

/// Attempts per mirrored write, with doubling backoff in between.
const MIRROR_ATTEMPTS: u32 = 3;
const MIRROR_BACKOFF: Duration = Duration::from_millis(250);

fn room_key(room_id: &str) -> String {
    format!("room:{room_id}")
}

fn player_key(player: u64) -> String {
    format!("player:{player}")
}

/// Handle to the Redis mirror. Cheap to clone; the connection manager
/// multiplexes and reconnects internally.
#[derive(Clone)]
pub struct Store {
    conn: ConnectionManager,
}

impl Store {
    /// Connects to Redis. Startup fails loudly here; everything after
    /// this point is best-effort.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("store connected");
        Ok(Self { conn })
    }

    /// Applies one room update with retries. Never fails outward: after
    /// the last attempt the update is logged and dropped.
    pub async fn mirror(&self, update: RoomUpdate) {
        let mut delay = MIRROR_BACKOFF;
        for attempt in 1..=MIRROR_ATTEMPTS {
            match self.apply(&update).await {
                Ok(()) => return,
                Err(err) if attempt < MIRROR_ATTEMPTS => {
                    tracing::warn!(%err, attempt, "mirror write failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => {
                    tracing::warn!(%err, ?update, "mirror write dropped");
                }
            }
        }
    }

    /// Top `n` leaderboard entries by score, descending.
    pub async fn leaderboard(&self, n: usize) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let mut conn = self.conn.clone();
        let stop = n.saturating_sub(1) as isize;
        let rows: Vec<(String, f64)> = conn
            .zrevrange_withscores(LEADERBOARD_KEY, 0, stop)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(username, score)| LeaderboardEntry {
                username,
                score: score as u32,
            })
            .collect())
    }

    async fn apply(&self, update: &RoomUpdate) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let now = Utc::now().to_rfc3339();
        match update {
            RoomUpdate::PlayerJoined {
                room_id,
                player,
                username,
            } => {
                let _: () = conn
                    .hset_multiple(
                        player_key(player.0),
                        &[
                            ("username", username.as_str()),
                            ("room", room_id.as_str()),
                            ("joined_at", now.as_str()),
                        ],
                    )
                    .await?;
                let _: () = conn
                    .hincr(room_key(room_id.as_str()), "players", 1_i64)
                    .await?;
                let _: () = conn
                    .hset(room_key(room_id.as_str()), "updated_at", now.as_str())
                    .await?;
            }
            RoomUpdate::PlayerLeft { room_id, player } => {
                // The career record outlives the room; only the
                // occupancy goes away.
                let _: () = conn.hdel(player_key(player.0), "room").await?;
                let _: () = conn
                    .hincr(room_key(room_id.as_str()), "players", -1_i64)
                    .await?;
            }
            RoomUpdate::GameStarted { room_id, players } => {
                let _: () = conn
                    .hset_multiple(
                        room_key(room_id.as_str()),
                        &[("started", "1"), ("updated_at", now.as_str())],
                    )
                    .await?;
                for player in players {
                    let _: () = conn
                        .hincr(player_key(player.0), "games_played", 1_i64)
                        .await?;
                }
            }
            RoomUpdate::GameEnded {
                room_id,
                winner,
                username,
                score,
            } => {
                let _: () = conn
                    .hset_multiple(
                        room_key(room_id.as_str()),
                        &[
                            ("ended", "1"),
                            ("winner", username.as_str()),
                            ("updated_at", now.as_str()),
                        ],
                    )
                    .await?;
                let _: () = conn
                    .hincr(player_key(winner.0), "games_won", 1_i64)
                    .await?;
                let _: () = conn
                    .hincr(player_key(winner.0), "score", *score as i64)
                    .await?;
                let _: () = conn
                    .zincr(LEADERBOARD_KEY, username.as_str(), *score as f64)
                    .await?;
            }
            RoomUpdate::RoomClosed { room_id } => {
                let _: () = conn.del(room_key(room_id.as_str())).await?;
            }
        }
        Ok(())
    }
}

/// Spawns the mirror task: drains room updates into the store until the
/// room layer shuts down. Gameplay never waits on this task.
pub fn spawn_mirror(
    store: Store,
    mut updates: mpsc::UnboundedReceiver<RoomUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            store.mirror(update).await;
        }
        tracing::debug!("mirror task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(room_key("AB12CD"), "room:AB12CD");
        assert_eq!(player_key(42), "player:42");
    }
}
