//! Room actor: an isolated Tokio task that owns one match.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Client intents and turn-clock expiries are
//! both just branches of the actor's `select!` loop, so they are applied
//! strictly one at a time.

use std::collections::HashMap;

use linecall_clock::TurnClock;
use linecall_game::{GameError, MarkOutcome, Match, Rules};
use linecall_protocol::{PlayerId, Recipient, RoomCode, RoomSummary, ServerEvent};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{RoomError, RoomUpdate, UpdateSender};

/// Channel sender for delivering server events to a player's connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// Join and Leave carry a reply channel because the caller needs the
/// outcome. Start and Mark are fire-and-forget: rule violations go back
/// to the offending player as an `Error` event on their own channel.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        username: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<LeaveReply, RoomError>>,
    },
    Start {
        player_id: PlayerId,
    },
    Mark {
        player_id: PlayerId,
        row: usize,
        col: usize,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Outcome of a leave, surfaced so the registry can drop empty rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveReply {
    pub now_empty: bool,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomCode,
    pub player_count: usize,
    pub max_players: usize,
    pub game_started: bool,
    pub game_ended: bool,
    /// Time since the last player-originated command.
    pub idle: std::time::Duration,
}

impl RoomInfo {
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.room_id.clone(),
            player_count: self.player_count,
            game_started: self.game_started,
            game_ended: self.game_ended,
        }
    }
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: just an `mpsc::Sender` wrapper. The `RoomRegistry`
/// holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomCode {
        &self.room_id
    }

    /// Whether both handles point at the same actor.
    pub(crate) fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        player_id: PlayerId,
        username: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                username,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Sends a leave request to the room.
    pub async fn leave(&self, player_id: PlayerId) -> Result<LeaveReply, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                player_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Asks the room to start its game (fire-and-forget).
    pub async fn start(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Start { player_id })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Delivers a mark attempt (fire-and-forget).
    pub async fn mark(
        &self,
        player_id: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Mark { player_id, row, col })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomCode,
    game: Match,
    clock: TurnClock,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, EventSender>,
    rng: StdRng,
    last_activity: Instant,
    updates: UpdateSender,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or the room empties out.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                tick = self.clock.wait_for_tick() => {
                    if tick.expired {
                        self.handle_turn_expiry();
                    } else {
                        self.game.tick_second();
                        self.dispatch(
                            Recipient::All,
                            ServerEvent::TurnCountdown {
                                room_id: self.room_id.clone(),
                                seconds_left: tick.seconds_left,
                            },
                        );
                    }
                }
            }
        }

        let _ = self.updates.send(RoomUpdate::RoomClosed {
            room_id: self.room_id.clone(),
        });
        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    /// Returns `true` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                username,
                sender,
                reply,
            } => {
                self.last_activity = Instant::now();
                let result = self.handle_join(player_id, username, sender);
                let _ = reply.send(result);
                false
            }
            RoomCommand::Leave { player_id, reply } => {
                self.last_activity = Instant::now();
                let result = self.handle_leave(player_id);
                let stop = matches!(result, Ok(LeaveReply { now_empty: true }));
                let _ = reply.send(result);
                stop
            }
            RoomCommand::Start { player_id } => {
                self.last_activity = Instant::now();
                self.handle_start(player_id);
                false
            }
            RoomCommand::Mark { player_id, row, col } => {
                self.last_activity = Instant::now();
                self.handle_mark(player_id, row, col);
                false
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
                false
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                true
            }
        }
    }

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        username: String,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        if self.game.phase() == linecall_game::Phase::Ended {
            return Err(RoomError::Ended(self.room_id.clone()));
        }
        if self.game.is_full() {
            return Err(RoomError::Full(self.room_id.clone()));
        }

        let seat = match self.game.add_player(player_id, username, &mut self.rng) {
            Ok(seat) => seat,
            Err(GameError::AlreadySeated(_)) => {
                return Err(RoomError::AlreadyInRoom(player_id, self.room_id.clone()));
            }
            Err(err) => {
                // add_player has no other failure modes today.
                tracing::warn!(room_id = %self.room_id, %err, "unexpected join failure");
                return Err(RoomError::Unavailable(self.room_id.clone()));
            }
        };
        let is_creator = seat.is_host;
        let username = seat.username.clone();
        self.senders.insert(player_id, sender);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.game.player_count(),
            "player joined"
        );

        let snapshot = self.game.snapshot(&self.room_id);
        if is_creator {
            self.dispatch(
                Recipient::Player(player_id),
                ServerEvent::RoomCreated { room: snapshot },
            );
        } else {
            let new_player = snapshot
                .players
                .iter()
                .find(|p| p.id == player_id)
                .cloned();
            self.dispatch(
                Recipient::Player(player_id),
                ServerEvent::RoomState { room: snapshot.clone() },
            );
            if let Some(new_player) = new_player {
                self.dispatch(
                    Recipient::AllExcept(player_id),
                    ServerEvent::PlayerJoined {
                        room: snapshot,
                        new_player,
                    },
                );
            }
        }

        let _ = self.updates.send(RoomUpdate::PlayerJoined {
            room_id: self.room_id.clone(),
            player: player_id,
            username,
        });
        Ok(())
    }

    fn handle_leave(&mut self, player_id: PlayerId) -> Result<LeaveReply, RoomError> {
        let outcome = self
            .game
            .remove_player(player_id)
            .map_err(|_| RoomError::NotInRoom(player_id))?;
        self.senders.remove(&player_id);

        tracing::info!(
            room_id = %self.room_id,
            %player_id,
            players = self.game.player_count(),
            "player left"
        );
        let _ = self.updates.send(RoomUpdate::PlayerLeft {
            room_id: self.room_id.clone(),
            player: player_id,
        });

        if outcome.now_empty {
            self.clock.disarm();
            return Ok(LeaveReply { now_empty: true });
        }

        let snapshot = self.game.snapshot(&self.room_id);
        self.dispatch(
            Recipient::All,
            ServerEvent::PlayerLeft {
                room_id: self.room_id.clone(),
                players: snapshot.players.clone(),
            },
        );
        if outcome.turn_passed_to.is_some() {
            // The leaver held the turn: fresh countdown for the inheritor.
            self.clock.arm(self.game.rules().turn_seconds);
            self.dispatch(Recipient::All, ServerEvent::GameState { state: snapshot });
        }

        Ok(LeaveReply { now_empty: false })
    }

    fn handle_start(&mut self, player_id: PlayerId) {
        let is_host = self
            .game
            .seats()
            .iter()
            .any(|s| s.id == player_id && s.is_host);
        if !is_host {
            self.send_error(player_id, "Only the host can start the game");
            return;
        }

        if let Err(err) = self.game.start() {
            self.send_error(player_id, &err.to_string());
            return;
        }

        tracing::info!(
            room_id = %self.room_id,
            players = self.game.player_count(),
            "game started"
        );
        self.clock.arm(self.game.rules().turn_seconds);
        let snapshot = self.game.snapshot(&self.room_id);
        self.dispatch(Recipient::All, ServerEvent::GameState { state: snapshot });
        let _ = self.updates.send(RoomUpdate::GameStarted {
            room_id: self.room_id.clone(),
            players: self.game.seats().iter().map(|s| s.id).collect(),
        });
    }

    fn handle_mark(&mut self, player_id: PlayerId, row: usize, col: usize) {
        match self.game.mark_cell(player_id, row, col) {
            Ok(MarkOutcome::Won { username, score_awarded }) => {
                self.clock.disarm();
                let winner = self.game.winner();
                let snapshot = self.game.snapshot(&self.room_id);
                self.dispatch(Recipient::All, ServerEvent::GameState { state: snapshot });
                self.dispatch(
                    Recipient::All,
                    ServerEvent::GameWon { winner: username.clone() },
                );
                if let Some(winner) = winner {
                    let _ = self.updates.send(RoomUpdate::GameEnded {
                        room_id: self.room_id.clone(),
                        winner,
                        username,
                        score: score_awarded,
                    });
                }
            }
            Ok(MarkOutcome::NextTurn { .. }) => {
                self.clock.arm(self.game.rules().turn_seconds);
                let snapshot = self.game.snapshot(&self.room_id);
                self.dispatch(Recipient::All, ServerEvent::GameState { state: snapshot });
            }
            Err(err) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    %player_id,
                    %err,
                    "mark rejected"
                );
                self.send_error(player_id, &err.to_string());
            }
        }
    }

    /// The countdown hit zero: auto-play the absent player.
    fn handle_turn_expiry(&mut self) {
        self.game.tick_second();
        let outcome = match self.game.expire_turn(&mut self.rng) {
            Ok(outcome) => outcome,
            Err(err) => {
                // Game ended or emptied between arming and expiry.
                tracing::debug!(room_id = %self.room_id, %err, "stale turn expiry");
                return;
            }
        };

        tracing::debug!(
            room_id = %self.room_id,
            skipped = %outcome.skipped_username,
            called = ?outcome.called_number,
            "turn expired, auto-played"
        );
        self.dispatch(
            Recipient::All,
            ServerEvent::PlayerSkipped {
                username: outcome.skipped_username,
            },
        );
        self.clock.arm(self.game.rules().turn_seconds);
        let snapshot = self.game.snapshot(&self.room_id);
        self.dispatch(Recipient::All, ServerEvent::GameState { state: snapshot });
    }

    /// Dispatches an event to the chosen recipients.
    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for sender in self.senders.values() {
                    let _ = sender.send(event.clone());
                }
            }
            Recipient::Player(pid) => {
                if let Some(sender) = self.senders.get(&pid) {
                    let _ = sender.send(event);
                }
            }
            Recipient::AllExcept(excluded) => {
                for (pid, sender) in &self.senders {
                    if *pid != excluded {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }

    /// An `error` event for the offending player only.
    fn send_error(&self, player_id: PlayerId, message: &str) {
        self.dispatch(
            Recipient::Player(player_id),
            ServerEvent::Error {
                message: message.to_owned(),
            },
        );
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            player_count: self.game.player_count(),
            max_players: self.game.rules().max_players,
            game_started: self.game.phase() != linecall_game::Phase::Waiting,
            game_ended: self.game.phase() == linecall_game::Phase::Ended,
            idle: self.last_activity.elapsed(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate
/// with it.
///
/// `channel_size` controls backpressure; if the channel fills up,
/// senders will wait (bounded channel).
pub(crate) fn spawn_room(
    room_id: RoomCode,
    rules: Rules,
    updates: UpdateSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_id: room_id.clone(),
        game: Match::new(rules),
        clock: TurnClock::new(),
        senders: HashMap::new(),
        rng: StdRng::from_os_rng(),
        last_activity: Instant::now(),
        updates,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
