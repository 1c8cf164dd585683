//! Search tuning constants.
//!
//! These are plain constants rather than values wired up to an external
//! SPSA/tuning harness: there's no tuner in this crate, so a `Default`-able
//! config struct is all the pruning and reduction code needs.

use crate::evaluate::MAX_PLY;

pub const MAX_DEPTH: usize = MAX_PLY;

// Feature toggles, mostly useful for isolating one heuristic at a time while
// debugging a regression.
pub const MOVE_ORDERING: bool = true;
pub const TT_MOVE: bool = true;
pub const MVV_LVA: bool = true;

/// Tunable constants for the negamax search. Grouped into a struct (rather
/// than bare consts) so a UCI `setoption` could plausibly override them at
/// runtime, even though nothing currently does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    // Null-move pruning
    pub nmp_base_reduction: usize,
    pub nmp_depth_divisor: usize,
    pub nmp_eval_divisor: i32,
    pub nmp_min_depth: usize,

    // Reverse futility pruning
    pub rfp_max_depth: usize,
    pub rfp_margin: i32,

    // Razoring
    pub razor_max_depth: usize,
    pub razor_margin: i32,

    // Futility pruning at frontier/pre-frontier nodes
    pub fp_max_depth: usize,
    pub fp_base: i32,
    pub fp_margin: i32,

    // Late move pruning
    pub lmp_max_depth: usize,
    pub lmp_base: usize,

    // Late move reductions
    pub lmr_min_depth: usize,
    pub lmr_min_move_index: usize,

    // SEE-based pruning of late quiets/captures
    pub see_quiet_margin: i32,
    pub see_capture_margin: i32,
    pub see_max_depth: usize,

    // Singular extensions
    pub se_min_depth: usize,
    pub se_margin: i32,

    // Internal iterative reduction: reduce nodes with no TT move one ply
    pub iir_min_depth: usize,

    // Aspiration windows
    pub aspiration_min_depth: usize,
    pub aspiration_base_window: i32,
    pub aspiration_max_attempts: usize,
    pub aspiration_growth: AspirationGrowth,
}

/// Controls how quickly a failed aspiration window widens on a re-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspirationGrowth {
    /// window += base on every failure
    Linear,
    /// window *= 1.5 on every failure
    Moderate,
    /// window *= 2 on every failure
    Exponential,
    /// Exponential, but falls back to the full `-inf/+inf` window once
    /// `aspiration_max_attempts` has been exceeded, rather than giving up.
    Adaptive,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            nmp_base_reduction: 3,
            nmp_depth_divisor: 4,
            nmp_eval_divisor: 200,
            nmp_min_depth: 3,

            rfp_max_depth: 8,
            rfp_margin: 80,

            razor_max_depth: 3,
            razor_margin: 300,

            fp_max_depth: 8,
            fp_base: 100,
            fp_margin: 80,

            lmp_max_depth: 8,
            lmp_base: 3,

            lmr_min_depth: 3,
            lmr_min_move_index: 3,

            see_quiet_margin: -50,
            see_capture_margin: -90,
            see_max_depth: 8,

            se_min_depth: 8,
            se_margin: 2,

            iir_min_depth: 4,

            aspiration_min_depth: 5,
            aspiration_base_window: 25,
            aspiration_max_attempts: 6,
            aspiration_growth: AspirationGrowth::Adaptive,
        }
    }
}

// Time management fractions, see `time_control.rs`. These are `u32`
// (rather than f64) so they compose directly with `Duration`'s `Mul<u32>`/
// `Div<u32>` impls without an intermediate cast at every call site.

/// Per-mille of the allowed time to spend on this move, absent `movestogo`.
pub fn base_time_frac() -> u32 {
    54
}

/// Percent of the base time allocated as the soft limit.
pub fn soft_time_frac() -> u32 {
    100
}

/// Percent of the base time allocated as the hard limit.
pub fn hard_time_frac() -> u32 {
    300
}

/// Percent of the total remaining time we refuse to exceed, regardless of
/// how the other fractions work out.
pub fn limit_time_frac() -> u32 {
    80
}

/// Percent of the increment folded into the base time allocation.
pub fn inc_frac() -> u32 {
    75
}

pub fn node_frac_base() -> f64 {
    1.70
}

pub fn node_frac_mult() -> f64 {
    1.50
}
