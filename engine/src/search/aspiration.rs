//! Aspiration window search.
//!
//! Rather than searching the root with a maximal window
//! (alpha = -inf, beta = +inf), guess that the score won't have moved far
//! from the previous iteration's result and search a narrow window around
//! that guess, hoping for quicker cutoffs. If the result falls outside the
//! window, we didn't know enough yet: widen it and try again.

use crate::evaluate::{Eval, Score, ScoreExt};
use crate::history_tables::pv::PVTable;
use crate::position::Position;

use super::params::AspirationGrowth;
use super::Search;

impl Position {
    pub fn aspiration_search(
        &self,
        depth: usize,
        guess: Score,
        pv: &mut PVTable,
        search: &mut Search,
    ) -> Score {
        let mut alpha = Score::MINUS_INF;
        let mut beta = Score::PLUS_INF;
        let mut width = search.params.aspiration_base_window;
        let mut attempts = 0;

        if depth >= search.params.aspiration_min_depth && !guess.is_mate() {
            alpha = Score::max(Score::MINUS_INF, guess - width);
            beta = Score::min(Score::PLUS_INF, guess + width);
        }

        loop {
            let score =
                self.negamax::<true>(0, depth, alpha, beta, pv, Eval::new(), false, false, search);

            if search.is_aborted() {
                return Score::MINUS_INF;
            }

            if score <= alpha {
                beta = (alpha + beta) / 2;
                alpha = Score::max(Score::MINUS_INF, score - width);
            } else if score >= beta {
                beta = Score::min(Score::PLUS_INF, score + width);
            } else {
                return score;
            }

            attempts += 1;
            width = grow(width, search.params.aspiration_growth);

            // Give up narrowing and fall back to a full window rather than
            // burning further attempts on a score that keeps escaping.
            if attempts >= search.params.aspiration_max_attempts {
                alpha = Score::MINUS_INF;
                beta = Score::PLUS_INF;
            }
        }
    }
}

fn grow(width: Score, growth: AspirationGrowth) -> Score {
    match growth {
        AspirationGrowth::Linear => width + 25,
        AspirationGrowth::Moderate => width + width / 2,
        AspirationGrowth::Exponential | AspirationGrowth::Adaptive => width * 2,
    }
}
