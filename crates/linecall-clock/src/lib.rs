//! One-second countdown clock for turn-based rooms.
//!
//! A [`TurnClock`] is armed at the start of each turn with the turn length
//! in seconds, then ticks once per second until it reaches zero. While
//! disarmed (no game running, game over, or between arm calls) the clock
//! pends forever, which makes it safe to keep as a permanent branch of a
//! room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         tick = clock.wait_for_tick() => {
//!             if tick.expired {
//!                 // auto-play the absent player, re-arm for the next turn
//!             } else {
//!                 // broadcast tick.seconds_left
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! The clock carries no game state of its own. The authoritative
//! `turn_time_left` lives in the match; the clock only decides *when* a
//! second has elapsed.

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace};

const ONE_SECOND: Duration = Duration::from_secs(1);

/// One elapsed second of an armed countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// Whole seconds remaining after this tick.
    pub seconds_left: u32,
    /// `true` on the final tick. The clock disarms itself; the caller
    /// re-arms it when the next turn starts.
    pub expired: bool,
}

/// A single room's turn countdown.
///
/// Deadlines are scheduled on the Tokio clock, so tests can drive the
/// countdown deterministically with `start_paused` and `time::advance`.
#[derive(Debug)]
pub struct TurnClock {
    /// Seconds remaining, `None` while disarmed.
    remaining: Option<u32>,
    /// When the next one-second tick fires.
    next_tick: Option<TokioInstant>,
}

impl TurnClock {
    /// A disarmed clock. [`wait_for_tick`](Self::wait_for_tick) pends
    /// until [`arm`](Self::arm) is called.
    pub fn new() -> Self {
        Self {
            remaining: None,
            next_tick: None,
        }
    }

    /// Starts (or restarts) the countdown at `seconds`. The first tick
    /// fires one second from now. Arming with 0 expires on that first tick.
    pub fn arm(&mut self, seconds: u32) {
        self.remaining = Some(seconds);
        self.next_tick = Some(TokioInstant::now() + ONE_SECOND);
        debug!(seconds, "turn clock armed");
    }

    /// Stops the countdown. Idempotent.
    pub fn disarm(&mut self) {
        if self.remaining.is_some() {
            self.remaining = None;
            self.next_tick = None;
            debug!("turn clock disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds left on the current countdown, `None` while disarmed.
    pub fn seconds_left(&self) -> Option<u32> {
        self.remaining
    }

    /// Waits until the next one-second boundary of an armed countdown.
    ///
    /// While disarmed this future never resolves on its own, but a
    /// surrounding `tokio::select!` still serves its other branches. On
    /// the expiring tick the clock disarms itself.
    pub async fn wait_for_tick(&mut self) -> ClockTick {
        let (next, remaining) = match (self.next_tick, self.remaining) {
            (Some(next), Some(remaining)) => (next, remaining),
            _ => {
                // This future never completes while disarmed.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next).await;

        let seconds_left = remaining.saturating_sub(1);
        let expired = seconds_left == 0;
        if expired {
            self.remaining = None;
            self.next_tick = None;
        } else {
            self.remaining = Some(seconds_left);
            // Schedule from the deadline, not from now, so a slow tick
            // handler does not stretch the turn.
            self.next_tick = Some(next + ONE_SECOND);
        }

        trace!(seconds_left, expired, "turn clock tick");
        ClockTick { seconds_left, expired }
    }
}

impl Default for TurnClock {
    fn default() -> Self {
        Self::new()
    }
}
