//! The per-room match state machine.
//!
//! Every transition is a single synchronous function from the current
//! state to (new state, outcome). The room actor calls these one at a
//! time, so a timer expiry and a concurrent mark can never interleave
//! mid-mutation.

use rand::Rng;

use linecall_protocol::{GameStateView, PlayerId, PlayerView, RoomCode};

use crate::{completed_lines, GameError, Grid, Marks, Rules};

/// Base points for winning; the rest is the time bonus.
const WIN_BASE_SCORE: u32 = 100;

/// Lifecycle of a match.
///
/// ```text
/// Waiting ──(start)──→ InProgress ──(winning mark)──→ Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Room exists, players gathering, no game yet.
    Waiting,
    /// Game running: turns rotate, the countdown is live.
    InProgress,
    /// A player won. Final state is readable, moves are rejected.
    Ended,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// One player's seat: identity plus their private board state.
#[derive(Debug, Clone)]
pub struct Seat {
    pub id: PlayerId,
    pub username: String,
    pub is_host: bool,
    pub grid: Grid,
    pub marks: Marks,
    pub score: u32,
    pub completed_lines: usize,
}

impl Seat {
    fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            username: self.username.clone(),
            score: self.score,
            completed_lines: self.completed_lines,
            is_host: self.is_host,
            grid: self.grid.rows().to_vec(),
            marked_cells: self.marks.rows().to_vec(),
        }
    }
}

/// Result of a successful voluntary mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The mark completed enough lines to win: the game is over.
    Won { username: String, score_awarded: u32 },
    /// The turn passed to the next player.
    NextTurn {
        completed_lines: usize,
        next_player: PlayerId,
    },
}

/// Result of a turn expiring unanswered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutOutcome {
    pub skipped_username: String,
    /// The number auto-called on behalf of the skipped player, `None`
    /// once every number has been called.
    pub called_number: Option<u16>,
    pub next_player: PlayerId,
}

/// Result of removing a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
    pub username: String,
    pub now_empty: bool,
    /// Set when the leaver held the turn and it passed on (timer must be
    /// re-armed by the caller).
    pub turn_passed_to: Option<PlayerId>,
}

/// Authoritative state of one room's game.
#[derive(Debug, Clone)]
pub struct Match {
    rules: Rules,
    seats: Vec<Seat>,
    called: Vec<u16>,
    phase: Phase,
    current_turn: Option<PlayerId>,
    turn_time_left: u32,
    winner: Option<PlayerId>,
}

impl Match {
    pub fn new(rules: Rules) -> Self {
        Self {
            rules: rules.validated(),
            seats: Vec::new(),
            called: Vec::new(),
            phase: Phase::Waiting,
            current_turn: None,
            turn_time_left: 0,
            winner: None,
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= self.rules.max_players
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.seats.iter().any(|s| s.id == player)
    }

    pub fn current_turn(&self) -> Option<PlayerId> {
        self.current_turn
    }

    pub fn turn_time_left(&self) -> u32 {
        self.turn_time_left
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn called_numbers(&self) -> &[u16] {
        &self.called
    }

    // -- transitions -------------------------------------------------------

    /// Seats a new player. The first player in becomes host.
    pub fn add_player(
        &mut self,
        player: PlayerId,
        username: String,
        rng: &mut impl Rng,
    ) -> Result<&Seat, GameError> {
        if self.contains(player) {
            return Err(GameError::AlreadySeated(player));
        }
        let idx = self.seats.len();
        let seat = Seat {
            id: player,
            username,
            is_host: self.seats.is_empty(),
            grid: Grid::generate(self.rules.grid_size, rng),
            marks: Marks::empty(self.rules.grid_size),
            score: 0,
            completed_lines: 0,
        };
        self.seats.push(seat);
        Ok(&self.seats[idx])
    }

    /// `Waiting → InProgress`. The first seat gets the opening turn.
    pub fn start(&mut self) -> Result<(), GameError> {
        match self.phase {
            Phase::Waiting => {}
            Phase::InProgress | Phase::Ended => return Err(GameError::AlreadyStarted),
        }
        if self.seats.len() < self.rules.min_players {
            return Err(GameError::InsufficientPlayers {
                have: self.seats.len(),
                need: self.rules.min_players,
            });
        }
        self.phase = Phase::InProgress;
        self.current_turn = Some(self.seats[0].id);
        self.turn_time_left = self.rules.turn_seconds;
        Ok(())
    }

    /// Marks a cell on the acting player's grid.
    ///
    /// Eligibility: it must be that player's turn, the cell's number must
    /// already be called, and the cell must be unmarked. A rejected mark
    /// leaves the match untouched.
    pub fn mark_cell(
        &mut self,
        player: PlayerId,
        row: usize,
        col: usize,
    ) -> Result<MarkOutcome, GameError> {
        match self.phase {
            Phase::Waiting => return Err(GameError::NotStarted),
            Phase::Ended => return Err(GameError::Over),
            Phase::InProgress => {}
        }
        if self.current_turn != Some(player) {
            return Err(GameError::NotYourTurn);
        }
        let n = self.rules.grid_size;
        if row >= n || col >= n {
            return Err(GameError::OutOfBounds { row, col });
        }
        let seat_idx = self
            .seats
            .iter()
            .position(|s| s.id == player)
            .ok_or(GameError::UnknownPlayer(player))?;

        let number = self.seats[seat_idx].grid.value(row, col);
        if !self.called.contains(&number) {
            return Err(GameError::NumberNotCalled(number));
        }
        if self.seats[seat_idx].marks.is_marked(row, col) {
            return Err(GameError::CellAlreadySelected { row, col });
        }

        let seat = &mut self.seats[seat_idx];
        seat.marks.mark(row, col);
        seat.completed_lines = completed_lines(&seat.marks).len();

        if seat.completed_lines >= self.rules.win_lines {
            // Winner, game over, timer bonus folded into the score. The
            // win fields and the phase flip together, before any caller
            // can observe the state again.
            let score = WIN_BASE_SCORE + 2 * self.turn_time_left;
            seat.score += score;
            let username = seat.username.clone();
            self.winner = Some(player);
            self.phase = Phase::Ended;
            self.current_turn = None;
            self.turn_time_left = 0;
            tracing::info!(%player, %username, score, "match won");
            return Ok(MarkOutcome::Won { username, score_awarded: score });
        }

        let next_player = self.advance_turn(player);
        Ok(MarkOutcome::NextTurn {
            completed_lines: self.seats[seat_idx].completed_lines,
            next_player,
        })
    }

    /// The active turn expired unanswered: auto-call a random uncalled
    /// number on the absent player's behalf and pass the turn.
    pub fn expire_turn(&mut self, rng: &mut impl Rng) -> Result<TimeoutOutcome, GameError> {
        if !self.phase.is_active() {
            return Err(GameError::NotStarted);
        }
        let current = self.current_turn.ok_or(GameError::NotStarted)?;
        let skipped_username = self
            .seats
            .iter()
            .find(|s| s.id == current)
            .map(|s| s.username.clone())
            .ok_or(GameError::UnknownPlayer(current))?;

        let called_number = self.call_random_number(rng);
        let next_player = self.advance_turn(current);

        Ok(TimeoutOutcome {
            skipped_username,
            called_number,
            next_player,
        })
    }

    /// One second of the active turn elapsed. Returns the seconds left.
    pub fn tick_second(&mut self) -> u32 {
        if self.phase.is_active() && self.turn_time_left > 0 {
            self.turn_time_left -= 1;
        }
        self.turn_time_left
    }

    /// Removes a player's seat. If they held the turn, it passes on and
    /// the caller must re-arm the countdown.
    pub fn remove_player(&mut self, player: PlayerId) -> Result<RemovalOutcome, GameError> {
        let idx = self
            .seats
            .iter()
            .position(|s| s.id == player)
            .ok_or(GameError::UnknownPlayer(player))?;
        let held_turn = self.current_turn == Some(player);
        let seat = self.seats.remove(idx);

        if self.seats.is_empty() {
            self.current_turn = None;
            return Ok(RemovalOutcome {
                username: seat.username,
                now_empty: true,
                turn_passed_to: None,
            });
        }

        let mut turn_passed_to = None;
        if held_turn && self.phase.is_active() {
            // The removed seat's slot now holds the next player in order.
            let next = self.seats[idx % self.seats.len()].id;
            self.current_turn = Some(next);
            self.turn_time_left = self.rules.turn_seconds;
            turn_passed_to = Some(next);
        }

        Ok(RemovalOutcome {
            username: seat.username,
            now_empty: false,
            turn_passed_to,
        })
    }

    /// Full snapshot for broadcast.
    pub fn snapshot(&self, room_id: &RoomCode) -> GameStateView {
        GameStateView {
            room_id: room_id.clone(),
            players: self.seats.iter().map(Seat::view).collect(),
            current_turn: self.current_turn,
            called_numbers: self.called.clone(),
            turn_time_left: self.turn_time_left,
            grid_size: self.rules.grid_size,
            game_started: self.phase != Phase::Waiting,
            game_ended: self.phase == Phase::Ended,
            winner: self.winner,
        }
    }

    // -- internals ---------------------------------------------------------

    /// Round-robin turn advance from `from`, resetting the countdown.
    fn advance_turn(&mut self, from: PlayerId) -> PlayerId {
        let idx = self
            .seats
            .iter()
            .position(|s| s.id == from)
            .unwrap_or(0);
        let next = self.seats[(idx + 1) % self.seats.len()].id;
        self.current_turn = Some(next);
        self.turn_time_left = self.rules.turn_seconds;
        next
    }

    /// Draws a random not-yet-called number, or `None` if exhausted.
    fn call_random_number(&mut self, rng: &mut impl Rng) -> Option<u16> {
        let max = (self.rules.grid_size * self.rules.grid_size) as u16;
        let available: Vec<u16> =
            (1..=max).filter(|n| !self.called.contains(n)).collect();
        if available.is_empty() {
            return None;
        }
        let number = available[rng.random_range(0..available.len())];
        self.called.push(number);
        Some(number)
    }
}
