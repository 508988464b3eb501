//! Pure game core for Linecall.
//!
//! Everything in this crate is deterministic given its inputs (randomness
//! comes in through an explicit `Rng`): no tasks, no channels, no clocks.
//! The room layer drives the [`Match`] state machine and owns the actual
//! countdown; this crate only answers "what happens to the state".
//!
//! # Key types
//!
//! - [`Grid`]: one player's N×N permutation of `1..=N²`
//! - [`Marks`] / [`completed_lines`]: marking matrix and win detection
//! - [`Rules`]: per-deployment constants (grid size, turn length, win
//!   threshold, player capacity)
//! - [`Match`]: the Waiting → InProgress → Ended state machine

mod error;
mod grid;
mod lines;
mod r#match;
mod rules;

pub use error::GameError;
pub use grid::{Grid, Marks};
pub use lines::{completed_lines, Line, LineKind};
pub use r#match::{MarkOutcome, Match, Phase, RemovalOutcome, Seat, TimeoutOutcome};
pub use rules::Rules;
