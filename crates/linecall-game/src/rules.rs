//! Per-deployment game constants.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Configuration for a match.
///
/// These are deployment constants, not per-room options: every room on a
/// server plays by the same rules. Out-of-range values are clamped by
/// [`Rules::validated`] rather than rejected, so a bad env var degrades to
/// a playable configuration instead of a refused room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    /// Board dimension N (the grid holds `1..=N²`).
    pub grid_size: usize,

    /// Seconds each player has to act before being auto-played.
    pub turn_seconds: u32,

    /// Completed lines (rows + columns + diagonals) required to win.
    pub win_lines: usize,

    /// Minimum players required to start a game.
    pub min_players: usize,

    /// Maximum players allowed in a room.
    pub max_players: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            grid_size: 5,
            turn_seconds: 15,
            win_lines: 5,
            min_players: 2,
            max_players: 8,
        }
    }
}

impl Rules {
    /// Smallest supported board.
    pub const MIN_GRID_SIZE: usize = 5;

    /// Largest supported board. Cell values are `u16`, and a 16×16 board
    /// already takes over four minutes of timeouts to call out.
    pub const MAX_GRID_SIZE: usize = 16;

    /// Total lines on a board: N rows + N columns + 2 diagonals.
    pub fn total_lines(&self) -> usize {
        2 * self.grid_size + 2
    }

    /// Clamp any out-of-range values so the rules are safe to use.
    pub fn validated(mut self) -> Self {
        if self.grid_size < Self::MIN_GRID_SIZE || self.grid_size > Self::MAX_GRID_SIZE {
            warn!(
                grid_size = self.grid_size,
                "grid_size out of range, clamping"
            );
            self.grid_size = self
                .grid_size
                .clamp(Self::MIN_GRID_SIZE, Self::MAX_GRID_SIZE);
        }
        if self.turn_seconds == 0 {
            warn!("turn_seconds must be positive, using 1");
            self.turn_seconds = 1;
        }
        let max_lines = self.total_lines();
        if self.win_lines == 0 || self.win_lines > max_lines {
            warn!(
                win_lines = self.win_lines,
                max_lines, "win_lines out of range, clamping"
            );
            self.win_lines = self.win_lines.clamp(1, max_lines);
        }
        if self.min_players < 2 {
            self.min_players = 2;
        }
        if self.max_players < self.min_players {
            warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, raising"
            );
            self.max_players = self.min_players;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = Rules::default();
        assert_eq!(rules.grid_size, 5);
        assert_eq!(rules.turn_seconds, 15);
        assert_eq!(rules.win_lines, 5);
        assert_eq!(rules.min_players, 2);
        assert_eq!(rules.max_players, 8);
    }

    #[test]
    fn test_validated_clamps_grid_size() {
        let rules = Rules { grid_size: 3, ..Rules::default() }.validated();
        assert_eq!(rules.grid_size, Rules::MIN_GRID_SIZE);

        let rules = Rules { grid_size: 100, ..Rules::default() }.validated();
        assert_eq!(rules.grid_size, Rules::MAX_GRID_SIZE);
    }

    #[test]
    fn test_validated_clamps_win_lines_to_total() {
        let rules = Rules { win_lines: 99, ..Rules::default() }.validated();
        assert_eq!(rules.win_lines, rules.total_lines());
    }

    #[test]
    fn test_validated_fixes_zero_turn_seconds() {
        let rules = Rules { turn_seconds: 0, ..Rules::default() }.validated();
        assert_eq!(rules.turn_seconds, 1);
    }

    #[test]
    fn test_validated_keeps_capacity_ordered() {
        let rules = Rules { min_players: 2, max_players: 1, ..Rules::default() }.validated();
        assert!(rules.max_players >= rules.min_players);
    }

    #[test]
    fn test_total_lines() {
        assert_eq!(Rules::default().total_lines(), 12);
    }
}
