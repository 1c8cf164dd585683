//! Quiescence search: once the main search runs out of depth, keep
//! searching captures and promotions (and, if the side to move is in
//! check, every legal reply) until the position is "quiet" enough that the
//! static eval can be trusted.
//!
//! A plain `legal_moves::<false>()` call filters out every quiet move,
//! including quiet king steps and blocks — fine when nothing is attacking
//! the king, but when in check that same filter throws away real
//! evasions, since a check can only be answered by capturing the checker,
//! blocking it, or moving the king, and the latter two are quiet moves.
//! So while in check this generates the full legal move list instead and
//! skips the stand-pat cutoff entirely, since "doing nothing" isn't a
//! legal option when in check.

use chess::movegen::moves::Move;

use crate::evaluate::{Eval, Score, ScoreExt};
use crate::history_tables::{CounterHistoryTable, HistoryTable, Killers};
use crate::move_picker::MovePicker;
use crate::position::Position;
use crate::transpositions::{NodeType, TTEntry};

use super::Search;

impl Position {
    pub fn quiescence(
        &self,
        ply: usize,
        mut alpha: Score,
        beta: Score,
        eval_state: Eval,
        search: &mut Search,
    ) -> Score {
        if search.is_aborted() {
            return Score::MINUS_INF;
        }

        search.nodes += 1;
        search.seldepth = search.seldepth.max(ply);

        if ply >= super::params::MAX_DEPTH {
            return eval_state.total(&self.board);
        }

        if self.board.is_rule_draw() || self.is_repetition() {
            return eval_state.draw_score(search.nodes);
        }

        let in_check = self.board.in_check();

        let tt_entry = search.tt.probe(self.hash);
        let tt_move = tt_entry.and_then(|entry| entry.get_move());

        if let Some(entry) = tt_entry {
            if entry.get_depth() == 0 {
                if let Some(score) = entry.try_score(0, alpha, beta, ply) {
                    return score;
                }
            }
        }

        let raw_eval =
            tt_entry.map_or_else(|| eval_state.total(&self.board), |entry| entry.get_eval());

        // In check, there's no "do nothing" option to fall back on: every
        // legal reply must be tried, and a low static eval doesn't mean the
        // position is actually bad (it might be mate-in-one the other way).
        let mut best_score = if in_check { -Score::MATE + ply as Score } else { raw_eval };

        if !in_check {
            if best_score >= beta {
                return best_score;
            }
            alpha = alpha.max(best_score);
        }

        let moves = self.board.legal_moves::<true>();
        if in_check && moves.is_empty() {
            return -Score::MATE + ply as Score;
        }

        let mut legal_moves = MovePicker::new(self, moves, tt_move, Killers::new(), None);
        legal_moves.only_good_tacticals = !in_check;

        let empty_history = HistoryTable::new();
        let empty_counter_history = CounterHistoryTable::new();

        let mut best_move = tt_move;
        let mut node_type = NodeType::Upper;

        while let Some(mv) = legal_moves.next(&empty_history, &empty_counter_history) {
            // Outside of check, skip captures that lose material outright;
            // there's no quiet follow-up to redeem them in quiescence.
            if !in_check && !mv.is_promotion() && !self.board.see(mv, 0) {
                continue;
            }

            let next_position = self.play_move(mv);
            let next_eval = eval_state.play_move(&next_position.board);

            let score = -next_position.quiescence(ply + 1, -beta, -alpha, next_eval, search);

            if score > best_score {
                best_score = score;
                best_move = Some(mv);

                if score > alpha {
                    alpha = score;
                    node_type = NodeType::Exact;
                }

                if score >= beta {
                    node_type = NodeType::Lower;
                    break;
                }
            }

            if search.is_aborted() {
                return Score::MINUS_INF;
            }
        }

        search.tt.insert(self.hash, TTEntry::new(
            self.hash,
            best_move.unwrap_or(Move::NULL),
            best_score,
            raw_eval,
            0,
            node_type,
            search.tt.get_age(),
            ply,
        ));

        best_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history_tables::SearchTables;
    use crate::time_control::TimeController;
    use crate::transpositions::TTable;
    use chess::board::Board;
    use chess::piece::Color;
    use uci::time_control::TimeControl;

    #[test]
    fn quiet_position_returns_the_static_eval() {
        let board = Board::default();
        let position = Position::new(board);

        let mut tt = TTable::with_capacity(1);
        let mut tables = SearchTables::new(128);
        let (mut tc, _handle) = TimeController::new(TimeControl::Infinite, Color::White);
        let mut search = Search::new(&mut tt, &mut tables, &mut tc, None);

        let score =
            position.quiescence(0, Score::MINUS_INF, Score::PLUS_INF, Eval::new(), &mut search);

        assert!(score.abs() < 200);
    }

    #[test]
    fn in_check_position_considers_every_legal_reply() {
        // White king on e1 in check from a rook on e8; only a block, a
        // capture, or a king move resolves it, and none of those are
        // tactical in the MVV-LVA sense except the potential capture.
        let board: Board = "4r3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let position = Position::new(board);

        let mut tt = TTable::with_capacity(1);
        let mut tables = SearchTables::new(128);
        let (mut tc, _handle) = TimeController::new(TimeControl::Infinite, Color::White);
        let mut search = Search::new(&mut tt, &mut tables, &mut tc, None);

        let score =
            position.quiescence(0, Score::MINUS_INF, Score::PLUS_INF, Eval::new(), &mut search);

        // The king can simply step aside; this is not a forced loss.
        assert!(score > -Score::MATE / 2);
    }
}
