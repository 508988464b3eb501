//! Integration tests for the room system.
//!
//! Every test runs with `start_paused = true` so turn clocks and idle
//! TTLs can be driven deterministically with `tokio::time`.

use std::time::Duration;

use linecall_game::Rules;
use linecall_protocol::{PlayerId, RoomCode, ServerEvent};
use linecall_room::{RoomRegistry, RoomUpdate};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

const TTL: Duration = Duration::from_secs(600);

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn code(s: &str) -> RoomCode {
    RoomCode::new(s).unwrap()
}

struct Harness {
    registry: RoomRegistry,
    updates: mpsc::UnboundedReceiver<RoomUpdate>,
}

fn harness(rules: Rules) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    Harness {
        registry: RoomRegistry::new(rules, TTL, tx),
        updates: rx,
    }
}

/// A connected player: their id plus the receiving end of their event
/// channel.
struct Client {
    id: PlayerId,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Client {
    fn new(id: u64) -> (Self, mpsc::UnboundedSender<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id: pid(id), rx }, tx)
    }

    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
        }
        out
    }
}

/// Lets fire-and-forget commands reach the room actor.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// A started two-player game in room AB12CD, events drained.
async fn started_game(h: &Harness) -> (Client, Client) {
    let (mut host, host_tx) = Client::new(1);
    let (mut guest, guest_tx) = Client::new(2);
    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), host_tx)
        .await
        .unwrap();
    h.registry
        .join_room(code("AB12CD"), guest.id, "guest".into(), guest_tx)
        .await
        .unwrap();
    h.registry.start_game(host.id, &code("AB12CD")).await.unwrap();
    settle().await;
    host.drain();
    guest.drain();
    (host, guest)
}

// =========================================================================
// Create / check / duplicate
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_and_check() {
    let h = harness(Rules::default());
    let (mut host, tx) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();

    assert!(h.registry.check_room(&code("AB12CD")));
    assert!(!h.registry.check_room(&code("NOPE")));
    assert_eq!(h.registry.room_count(), 1);

    let events = host.drain();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::RoomCreated { room }] if room.players.len() == 1
    ));
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_room_code_rejected() {
    let h = harness(Rules::default());
    let (host, tx) = Client::new(1);
    let (other, tx2) = Client::new(2);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();
    let err = h
        .registry
        .create_room(code("AB12CD"), other.id, "other".into(), tx2)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room already exists");
}

#[tokio::test(start_paused = true)]
async fn test_join_unknown_room_rejected() {
    let h = harness(Rules::default());
    let (guest, tx) = Client::new(2);

    let err = h
        .registry
        .join_room(code("NOPE"), guest.id, "guest".into(), tx)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room not found");
}

#[tokio::test(start_paused = true)]
async fn test_full_room_rejects_join() {
    let rules = Rules { max_players: 2, ..Rules::default() };
    let h = harness(rules);
    let (host, tx1) = Client::new(1);
    let (guest, tx2) = Client::new(2);
    let (late, tx3) = Client::new(3);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx1)
        .await
        .unwrap();
    h.registry
        .join_room(code("AB12CD"), guest.id, "guest".into(), tx2)
        .await
        .unwrap();
    let err = h
        .registry
        .join_room(code("AB12CD"), late.id, "late".into(), tx3)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room is full");
}

#[tokio::test(start_paused = true)]
async fn test_one_room_at_a_time() {
    let h = harness(Rules::default());
    let (host, tx) = Client::new(1);
    let (_, tx2) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();
    let err = h
        .registry
        .create_room(code("OTHER"), host.id, "host".into(), tx2)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Already in a room");
}

// =========================================================================
// Registry concurrency
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_intents_for_different_rooms_run_concurrently() {
    let h = harness(Rules::default());
    let (mut a, tx_a) = Client::new(1);
    let (mut b, tx_b) = Client::new(2);

    // Both creations borrow the registry shared, so neither waits for
    // the other's actor round-trip.
    let (ra, rb) = tokio::join!(
        h.registry.create_room(code("ROOMA"), a.id, "a".into(), tx_a),
        h.registry.create_room(code("ROOMB"), b.id, "b".into(), tx_b),
    );
    ra.unwrap();
    rb.unwrap();

    assert_eq!(h.registry.room_count(), 2);
    assert!(matches!(
        a.drain().as_slice(),
        [ServerEvent::RoomCreated { .. }]
    ));
    assert!(matches!(
        b.drain().as_slice(),
        [ServerEvent::RoomCreated { .. }]
    ));
}

#[tokio::test(start_paused = true)]
async fn test_refused_join_releases_the_player() {
    let rules = Rules { max_players: 2, ..Rules::default() };
    let h = harness(rules);
    let (host, tx1) = Client::new(1);
    let (guest, tx2) = Client::new(2);
    let (late, tx3) = Client::new(3);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx1)
        .await
        .unwrap();
    h.registry
        .join_room(code("AB12CD"), guest.id, "guest".into(), tx2)
        .await
        .unwrap();
    let err = h
        .registry
        .join_room(code("AB12CD"), late.id, "late".into(), tx3)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Room is full");

    // The refused join must not leave a stale seat reservation behind.
    let (late, tx4) = Client::new(3);
    h.registry
        .create_room(code("OTHER"), late.id, "late".into(), tx4)
        .await
        .unwrap();
}

// =========================================================================
// Join broadcasts
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_join_notifies_room_and_snapshots_joiner() {
    let h = harness(Rules::default());
    let (mut host, tx1) = Client::new(1);
    let (mut guest, tx2) = Client::new(2);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx1)
        .await
        .unwrap();
    host.drain();

    h.registry
        .join_room(code("AB12CD"), guest.id, "guest".into(), tx2)
        .await
        .unwrap();

    let guest_events = guest.drain();
    assert!(matches!(
        guest_events.as_slice(),
        [ServerEvent::RoomState { room }] if room.players.len() == 2
    ));

    let host_events = host.drain();
    assert!(matches!(
        host_events.as_slice(),
        [ServerEvent::PlayerJoined { new_player, .. }] if new_player.username == "guest"
    ));
}

// =========================================================================
// Starting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_only_host_can_start() {
    let h = harness(Rules::default());
    let (mut host, tx1) = Client::new(1);
    let (mut guest, tx2) = Client::new(2);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx1)
        .await
        .unwrap();
    h.registry
        .join_room(code("AB12CD"), guest.id, "guest".into(), tx2)
        .await
        .unwrap();
    host.drain();
    guest.drain();

    h.registry.start_game(guest.id, &code("AB12CD")).await.unwrap();
    settle().await;

    // Rejection goes to the offender only.
    let guest_events = guest.drain();
    assert!(matches!(
        guest_events.as_slice(),
        [ServerEvent::Error { message }] if message == "Only the host can start the game"
    ));
    assert!(host.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_start_broadcasts_game_state() {
    let h = harness(Rules::default());
    let (mut host, tx1) = Client::new(1);
    let (mut guest, tx2) = Client::new(2);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx1)
        .await
        .unwrap();
    h.registry
        .join_room(code("AB12CD"), guest.id, "guest".into(), tx2)
        .await
        .unwrap();
    host.drain();
    guest.drain();

    h.registry.start_game(host.id, &code("AB12CD")).await.unwrap();
    settle().await;

    for client in [&mut host, &mut guest] {
        let events = client.drain();
        assert!(matches!(
            events.as_slice(),
            [ServerEvent::GameState { state }]
                if state.game_started && state.current_turn == Some(pid(1))
        ));
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_alone_rejected() {
    let h = harness(Rules::default());
    let (mut host, tx) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();
    host.drain();

    h.registry.start_game(host.id, &code("AB12CD")).await.unwrap();
    settle().await;

    let events = host.drain();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::Error { message }] if message == "Need at least 2 players to start"
    ));
}

// =========================================================================
// Turn clock
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_broadcast() {
    let h = harness(Rules::default());
    let (mut host, _guest) = started_game(&h).await;

    tokio::time::sleep(Duration::from_secs(3)).await;

    let ticks: Vec<u32> = host
        .drain()
        .into_iter()
        .filter_map(|ev| match ev {
            ServerEvent::TurnCountdown { seconds_left, .. } => Some(seconds_left),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![14, 13, 12]);
}

#[tokio::test(start_paused = true)]
async fn test_turn_expiry_auto_plays_and_rotates() {
    let h = harness(Rules::default());
    let (mut host, mut guest) = started_game(&h).await;

    tokio::time::sleep(Duration::from_secs(16)).await;

    let events = guest.drain();
    let skipped = events.iter().any(
        |ev| matches!(ev, ServerEvent::PlayerSkipped { username } if username == "host"),
    );
    assert!(skipped, "expected host to be skipped: {events:?}");

    let state = events
        .iter()
        .rev()
        .find_map(|ev| match ev {
            ServerEvent::GameState { state } => Some(state),
            _ => None,
        })
        .expect("game state after expiry");
    assert_eq!(state.current_turn, Some(pid(2)));
    assert_eq!(state.called_numbers.len(), 1);
    host.drain();
}

#[tokio::test(start_paused = true)]
async fn test_rotation_wraps_back_to_first_player() {
    let h = harness(Rules::default());
    let (mut host, _guest) = started_game(&h).await;

    // Two full timeouts: host -> guest -> host.
    tokio::time::sleep(Duration::from_secs(31)).await;

    let last_state = host
        .drain()
        .into_iter()
        .rev()
        .find_map(|ev| match ev {
            ServerEvent::GameState { state } => Some(state),
            _ => None,
        })
        .expect("game state after two expiries");
    assert_eq!(last_state.current_turn, Some(pid(1)));
    assert_eq!(last_state.called_numbers.len(), 2);
}

// =========================================================================
// Marking
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_mark_before_any_call_is_rejected_to_offender() {
    let h = harness(Rules::default());
    let (mut host, mut guest) = started_game(&h).await;

    h.registry
        .mark_cell(host.id, &code("AB12CD"), 0, 0)
        .await
        .unwrap();
    settle().await;

    let events = host.drain();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::Error { message }] if message.contains("has not been called yet")
    ));
    assert!(guest.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_mark_requires_membership() {
    let h = harness(Rules::default());
    let (_host, _guest) = started_game(&h).await;

    let err = h
        .registry
        .mark_cell(pid(99), &code("AB12CD"), 0, 0)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not in a room");
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_leave_notifies_remaining_players() {
    let h = harness(Rules::default());
    let (mut host, mut guest) = started_game(&h).await;

    let left = h.registry.leave_room(guest.id).await.unwrap();
    assert_eq!(left, code("AB12CD"));
    settle().await;

    let events = host.drain();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::PlayerLeft { players, .. }] if players.len() == 1
    ));
    guest.drain();
}

#[tokio::test(start_paused = true)]
async fn test_leaver_holding_turn_passes_it() {
    let h = harness(Rules::default());
    let (mut host, mut guest) = started_game(&h).await;

    // Host holds the opening turn and leaves.
    h.registry.leave_room(host.id).await.unwrap();
    settle().await;

    let events = guest.drain();
    let state = events
        .iter()
        .rev()
        .find_map(|ev| match ev {
            ServerEvent::GameState { state } => Some(state),
            _ => None,
        })
        .expect("game state after leave");
    assert_eq!(state.current_turn, Some(pid(2)));
    host.drain();
}

#[tokio::test(start_paused = true)]
async fn test_last_leave_removes_room() {
    let h = harness(Rules::default());
    let (host, tx) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();
    h.registry.leave_room(host.id).await.unwrap();

    assert_eq!(h.registry.room_count(), 0);
    assert!(!h.registry.check_room(&code("AB12CD")));

    // The code is reusable immediately.
    let (host2, tx2) = Client::new(3);
    h.registry
        .create_room(code("AB12CD"), host2.id, "again".into(), tx2)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_leave_without_room_rejected() {
    let h = harness(Rules::default());
    let err = h.registry.leave_room(pid(7)).await.unwrap_err();
    assert_eq!(err.to_string(), "Not in a room");
}

// =========================================================================
// Idle sweep
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_sweep_removes_idle_rooms() {
    let h = harness(Rules::default());
    let (host, tx) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();

    tokio::time::sleep(TTL + Duration::from_secs(1)).await;
    let removed = h.registry.sweep().await;
    assert_eq!(removed, 1);
    assert_eq!(h.registry.room_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_keeps_active_rooms() {
    let h = harness(Rules::default());
    let (host, tx) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();

    tokio::time::sleep(TTL / 2).await;
    let removed = h.registry.sweep().await;
    assert_eq!(removed, 0);
    assert_eq!(h.registry.room_count(), 1);
}

// =========================================================================
// Store updates
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_updates_mirror_lifecycle() {
    let mut h = harness(Rules::default());
    let (host, tx) = Client::new(1);

    h.registry
        .create_room(code("AB12CD"), host.id, "host".into(), tx)
        .await
        .unwrap();
    h.registry.leave_room(host.id).await.unwrap();
    settle().await;

    let mut kinds = Vec::new();
    while let Ok(update) = h.updates.try_recv() {
        kinds.push(update);
    }
    assert!(matches!(kinds[0], RoomUpdate::PlayerJoined { .. }));
    assert!(matches!(kinds[1], RoomUpdate::PlayerLeft { .. }));
    assert!(matches!(kinds.last(), Some(RoomUpdate::RoomClosed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_game_start_update_lists_seated_players() {
    let mut h = harness(Rules::default());
    let (_host, _guest) = started_game(&h).await;

    let mut players_at_start = None;
    while let Ok(update) = h.updates.try_recv() {
        if let RoomUpdate::GameStarted { players, .. } = update {
            players_at_start = Some(players);
        }
    }
    // The mirror bumps per-player counters off this list, so it must
    // name everyone who was seated when the game began.
    let players = players_at_start.expect("game start update");
    assert_eq!(players, vec![pid(1), pid(2)]);
}
