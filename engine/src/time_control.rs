//! Time/progress tracking for a single search.
//!
//! A search can run under a few different constraints:
//!
//! 1. Fixed depth: search to a nominal depth of N plies (quiescence search
//!    isn't counted against this).
//! 2. Fixed nodes: search until a node budget is exhausted.
//! 3. Fixed time: search for at most N milliseconds.
//! 4. Clock: given a remaining clock time (and maybe increments), divide it
//!    sensibly across the remaining moves of the game.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess::piece::Color;
use uci::time_control::TimeControl;

use crate::search::params::{
    base_time_frac, hard_time_frac, inc_frac, limit_time_frac, node_frac_base, node_frac_mult,
    soft_time_frac,
};

/// Reserve this much of every time budget for UCI I/O overhead.
const OVERHEAD: Duration = Duration::from_millis(20);

/// How many nodes to search between checks of the clock/stop flag.
const CHECKUP_WINDOW: u64 = 4096;

#[derive(Debug, Clone)]
pub struct TimeController {
    tc: TimeControl,
    start: Instant,

    base_soft_time: Duration,
    soft_time: Duration,
    hard_time: Duration,

    stop: Arc<AtomicBool>,
    next_checkup: u64,

    /// Set by the search to signal that no further ID iteration is worth
    /// starting (e.g. a forced move, or a found mate).
    stop_early: bool,

    bm_stability_factor: f64,
    node_frac_factor: f64,
    score_stability_factor: f64,
}

impl TimeController {
    const BESTMOVE_STABILITY: [f64; 5] = [2.50, 1.20, 0.90, 0.80, 0.75];
    const SCORE_STABILITY: [f64; 5] = [1.25, 1.15, 1.00, 0.94, 0.88];

    /// Create a controller for the given time control, plus a handle the
    /// caller can use to abort the search from another thread.
    pub fn new(tc_type: TimeControl, side: Color) -> (Self, TimeControlHandle) {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = TimeControlHandle { stop: stop.clone() };

        let mut tc = TimeController {
            tc: tc_type,
            base_soft_time: Duration::ZERO,
            soft_time: Duration::ZERO,
            hard_time: Duration::ZERO,
            start: Instant::now(),
            stop: stop.clone(),
            next_checkup: CHECKUP_WINDOW,
            stop_early: false,
            bm_stability_factor: 1.0,
            node_frac_factor: 1.0,
            score_stability_factor: 1.0,
        };

        match tc_type {
            TimeControl::FixedTime(max_time) => {
                tc.hard_time = max_time.saturating_sub(OVERHEAD);
                tc.soft_time = tc.hard_time;
            }

            TimeControl::Clock { wtime, btime, winc, binc, movestogo } => {
                let time = if side.is_white() { wtime } else { btime };
                let inc = if side.is_white() { winc } else { binc }.unwrap_or_default();

                let allowed_time = time.saturating_sub(OVERHEAD);
                let limit_time = allowed_time * limit_time_frac() / 100;

                let base_time = if let Some(movestogo) = movestogo {
                    allowed_time / movestogo + inc * inc_frac() / 100
                } else {
                    allowed_time * base_time_frac() / 1000 + inc * inc_frac() / 100
                };

                tc.hard_time = (base_time * hard_time_frac() / 100).min(limit_time);
                tc.base_soft_time = (base_time * soft_time_frac() / 100).min(limit_time);
                tc.soft_time = tc.base_soft_time;
            }

            _ => {}
        }

        (tc, handle)
    }

    /// Whether the search should keep going, given it has searched `nodes`
    /// so far. Only actually checked the clock/stop flag once every
    /// `CHECKUP_WINDOW` nodes, to keep the check cheap.
    pub fn should_continue(&mut self, nodes: u64) -> bool {
        if nodes < self.next_checkup {
            return true;
        }

        self.next_checkup = nodes + CHECKUP_WINDOW;

        if self.stopped() {
            return false;
        }

        match self.tc {
            TimeControl::Nodes(max_nodes) => self.next_checkup < max_nodes as u64,
            TimeControl::FixedTime(_) => self.elapsed() < self.hard_time,
            TimeControl::Clock { .. } => self.elapsed() < self.hard_time,
            _ => true,
        }
    }

    /// Whether another iterative-deepening iteration is worth starting.
    pub fn should_start_search(&self, depth: usize) -> bool {
        if depth <= 1 {
            return true;
        }

        if self.stopped() {
            return false;
        }

        match self.tc {
            TimeControl::Depth(max_depth) => depth <= max_depth,
            TimeControl::Nodes(max_nodes) => self.next_checkup < max_nodes as u64,
            TimeControl::FixedTime(_) => self.elapsed() < self.hard_time,

            TimeControl::Clock { .. } => {
                if self.stop_early {
                    return false;
                }

                let mut adjusted_soft_time = self.soft_time.as_millis() as f64;
                adjusted_soft_time *= self.bm_stability_factor;
                adjusted_soft_time *= self.node_frac_factor;

                if depth >= 7 {
                    adjusted_soft_time *= self.score_stability_factor;
                }

                (self.elapsed().as_millis() as f64) < adjusted_soft_time
            }

            _ => true,
        }
    }

    /// Fold information gathered during the just-finished iteration into
    /// the soft time limit used to decide on the next one: how stable the
    /// best move and its score have been, and what fraction of the node
    /// budget went into searching it.
    pub fn update(&mut self, bm_stability: usize, node_frac: f64, score_stability: usize) {
        self.bm_stability_factor = Self::BESTMOVE_STABILITY[bm_stability.min(4)];
        self.score_stability_factor = Self::SCORE_STABILITY[score_stability.min(4)];
        self.node_frac_factor = (node_frac_base() - node_frac) * node_frac_mult();
    }

    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn stop_early(&mut self) {
        self.stop_early = true;
    }
}

/// A cheaply-cloneable handle used to abort a running search from outside
/// the search thread (e.g. in response to a UCI `stop` command).
#[derive(Clone)]
pub struct TimeControlHandle {
    stop: Arc<AtomicBool>,
}

impl TimeControlHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_caps_hard_time_at_requested_duration() {
        let (tc, _handle) = TimeController::new(
            TimeControl::FixedTime(Duration::from_millis(1000)),
            Color::White,
        );
        assert!(tc.hard_time <= Duration::from_millis(1000));
    }

    #[test]
    fn stop_flag_halts_should_continue() {
        let (mut tc, handle) = TimeController::new(TimeControl::Infinite, Color::White);
        handle.stop();
        assert!(!tc.should_continue(CHECKUP_WINDOW));
    }

    #[test]
    fn clock_allocates_a_fraction_of_remaining_time() {
        let (tc, _handle) = TimeController::new(
            TimeControl::Clock {
                wtime: Duration::from_secs(60),
                btime: Duration::from_secs(60),
                winc: None,
                binc: None,
                movestogo: None,
            },
            Color::White,
        );

        assert!(tc.hard_time > Duration::ZERO);
        assert!(tc.hard_time < Duration::from_secs(60));
    }
}
